//! Protocol-agnostic remote operations.
//!
//! [`RemoteOperations`] is the capability contract every protocol binding
//! implements: list, retrieve, store, delete, rename, plus connection
//! lifecycle. The consumer, producer, and endpoint are written against this
//! trait only; `ops::ftp` supplies the FTP variant.

pub mod ftp;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransferError;

/// One entry of a remote directory listing.
#[derive(Debug)]
pub struct RemoteEntry<M> {
    pub name: String,
    pub size: u64,
    /// Modification time (unix seconds).
    pub modified: i64,
    pub is_dir: bool,
    /// Protocol-native metadata for this entry, shared into the file model.
    pub native: Arc<M>,
}

impl<M> Clone for RemoteEntry<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            size: self.size,
            modified: self.modified,
            is_dir: self.is_dir,
            native: self.native.clone(),
        }
    }
}

/// Capability contract of a protocol binding.
///
/// Implementations own the live connection; `&mut self` gives one caller
/// exclusive use of it for the duration of each call.
#[async_trait]
pub trait RemoteOperations: Send {
    /// Protocol-native per-entry metadata shape.
    type Meta: Send + Sync + 'static;

    /// Establish the connection: connect, authenticate, and negotiate
    /// modes. Idempotent on a live connection.
    async fn connect(&mut self) -> Result<(), TransferError>;

    /// Close the connection. Idempotent when already closed.
    async fn disconnect(&mut self) -> Result<(), TransferError>;

    fn is_connected(&self) -> bool;

    async fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry<Self::Meta>>, TransferError>;

    async fn retrieve(&mut self, path: &str) -> Result<Bytes, TransferError>;

    async fn store(&mut self, path: &str, body: Bytes) -> Result<(), TransferError>;

    async fn delete(&mut self, path: &str) -> Result<(), TransferError>;

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransferError>;

    /// Create a directory and any missing parents.
    async fn mkdirs(&mut self, path: &str) -> Result<(), TransferError>;
}
