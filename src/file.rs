//! Generic and remote file models.
//!
//! `GenericFile` is one file observation, parametric over the
//! protocol-native metadata shape each binding attaches to its entries.
//! `RemoteFile` is the remote specialization: it carries the hostname and
//! fixes the separator to `/` regardless of the connecting host's OS.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::TransferError;

/// Strategy for realizing a file's content on first access.
pub trait ContentBinding: Send + Sync {
    fn fetch(&self) -> Result<Bytes, TransferError>;
}

/// Content already held in memory.
///
/// The consumer retrieves eagerly during the poll cycle and binds the
/// result, so later reads through the binding are free.
pub struct InMemoryBinding(pub Bytes);

impl ContentBinding for InMemoryBinding {
    fn fetch(&self) -> Result<Bytes, TransferError> {
        Ok(self.0.clone())
    }
}

/// One file observation, independent of protocol.
///
/// `M` is the protocol-native metadata type; the core never looks inside
/// it. Scalars are plain fields; the body is realized lazily through the
/// attached [`ContentBinding`].
pub struct GenericFile<M> {
    pub absolute: bool,
    pub absolute_path: String,
    pub relative_path: String,
    pub file_name: String,
    pub file_length: u64,
    /// Modification time (unix seconds).
    pub last_modified: i64,
    /// Protocol-specific metadata. Shared by reference, never deep-copied.
    pub native: Option<Arc<M>>,
    body: Option<Bytes>,
    binding: Option<Arc<dyn ContentBinding>>,
}

impl<M> GenericFile<M> {
    pub fn new() -> Self {
        Self {
            absolute: false,
            absolute_path: String::new(),
            relative_path: String::new(),
            file_name: String::new(),
            file_length: 0,
            last_modified: 0,
            native: None,
            body: None,
            binding: None,
        }
    }

    /// Separator this observation's paths use.
    pub fn separator(&self) -> char {
        std::path::MAIN_SEPARATOR
    }

    /// Whether paths may need canonicalizing before use.
    pub fn needs_normalize(&self) -> bool {
        true
    }

    /// A populated observation must name its file and anchor it with at
    /// least one path; anything else is never forwarded downstream.
    pub fn is_forwardable(&self) -> bool {
        !self.file_name.is_empty()
            && (!self.absolute_path.is_empty() || !self.relative_path.is_empty())
    }

    /// Already-realized body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_binding(&mut self, binding: Arc<dyn ContentBinding>) {
        self.binding = Some(binding);
    }

    /// Realize the body through the binding, caching the result.
    pub fn realize_body(&mut self) -> Result<Bytes, TransferError> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        let binding = self.binding.as_ref().ok_or_else(|| TransferError::Retrieval {
            path: self.absolute_path.clone(),
            reason: "no content binding attached".to_string(),
        })?;
        let body = binding.fetch()?;
        self.body = Some(body.clone());
        Ok(body)
    }
}

impl<M> Default for GenericFile<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for GenericFile<M> {
    fn clone(&self) -> Self {
        Self {
            absolute: self.absolute,
            absolute_path: self.absolute_path.clone(),
            relative_path: self.relative_path.clone(),
            file_name: self.file_name.clone(),
            file_length: self.file_length,
            last_modified: self.last_modified,
            native: self.native.clone(),
            body: self.body.clone(),
            binding: self.binding.clone(),
        }
    }
}

/// A file observed on a remote server.
pub struct RemoteFile<M> {
    pub file: GenericFile<M>,
    pub hostname: String,
}

impl<M> RemoteFile<M> {
    pub fn new(file: GenericFile<M>, hostname: String) -> Self {
        Self { file, hostname }
    }

    /// Remote listings arrive canonical.
    pub fn needs_normalize(&self) -> bool {
        false
    }

    /// Always `/`, whatever the local OS separator is.
    pub fn separator(&self) -> char {
        '/'
    }

    pub fn is_forwardable(&self) -> bool {
        self.file.is_forwardable()
    }

    /// Produce an independent value from `source`.
    ///
    /// Scalar fields (paths, name, length, timestamp, hostname) are copied
    /// by value, so mutating the copy never touches the source. The native
    /// metadata handle and the content binding are shared read-only
    /// references: content realization is deferred, and the copy must go
    /// through the same strategy to load it.
    pub fn copy_from(source: &RemoteFile<M>) -> RemoteFile<M> {
        RemoteFile {
            file: GenericFile {
                absolute: source.file.absolute,
                absolute_path: source.file.absolute_path.clone(),
                relative_path: source.file.relative_path.clone(),
                file_name: source.file.file_name.clone(),
                file_length: source.file.file_length,
                last_modified: source.file.last_modified,
                native: source.file.native.clone(),
                body: source.file.body.clone(),
                binding: source.file.binding.clone(),
            },
            hostname: source.hostname.clone(),
        }
    }
}

impl<M> Clone for RemoteFile<M> {
    fn clone(&self) -> Self {
        RemoteFile::copy_from(self)
    }
}
