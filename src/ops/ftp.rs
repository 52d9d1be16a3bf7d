//! FTP binding.
//!
//! [`FtpTransport`] is the boundary to the native protocol client library:
//! the wire primitives (connect/login/list/retr/stor/...) and nothing of
//! the endpoint model. [`FtpOperations`] adapts that surface to the
//! [`RemoteOperations`] contract and owns connect, login, and mode
//! negotiation before first use.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::TransferError;
use crate::ops::{RemoteEntry, RemoteOperations};
use crate::options::{ClientOptions, FtpPolicy};

/// User presented when the address carries no credentials.
pub const ANONYMOUS_USER: &str = "anonymous";

/// One raw listing fact as the native client reports it.
#[derive(Debug, Clone)]
pub struct FtpListEntry {
    pub name: String,
    pub size: u64,
    /// Modification time (unix seconds).
    pub modified: i64,
    pub is_dir: bool,
    /// Unparsed listing line as the server sent it.
    pub raw: String,
}

/// Protocol-native metadata attached to each FTP file observation.
#[derive(Debug, Clone)]
pub struct FtpMetadata {
    pub raw_listing: String,
    pub is_dir: bool,
}

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct ConnectSpec {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Wire primitives supplied by a native FTP client library.
///
/// Implementations hold whatever socket state the library needs; the
/// adapter never inspects it. Connection options are handed to `connect`
/// so an injected, pre-built client still gets configured before login.
#[async_trait]
pub trait FtpTransport: Send {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        options: &ClientOptions,
    ) -> io::Result<()>;

    async fn login(&mut self, user: &str, password: &str) -> io::Result<()>;

    /// Attach server-behavior hints (time zone, listing style).
    fn apply_policy(&mut self, policy: &FtpPolicy);

    async fn list(&mut self, path: &str) -> io::Result<Vec<FtpListEntry>>;

    async fn retr(&mut self, path: &str) -> io::Result<Bytes>;

    async fn stor(&mut self, path: &str, body: Bytes) -> io::Result<()>;

    async fn dele(&mut self, path: &str) -> io::Result<()>;

    async fn rename(&mut self, from: &str, to: &str) -> io::Result<()>;

    async fn mkd(&mut self, path: &str) -> io::Result<()>;

    async fn quit(&mut self) -> io::Result<()>;

    fn is_connected(&self) -> bool;
}

/// FTP implementation of [`RemoteOperations`] over a native client `C`.
pub struct FtpOperations<C> {
    client: C,
    spec: ConnectSpec,
    options: ClientOptions,
    policy: Option<FtpPolicy>,
}

impl<C: FtpTransport> FtpOperations<C> {
    pub fn new(
        client: C,
        spec: ConnectSpec,
        options: ClientOptions,
        policy: Option<FtpPolicy>,
    ) -> Self {
        Self {
            client,
            spec,
            options,
            policy,
        }
    }

    fn connection_error(&self, reason: impl ToString) -> TransferError {
        TransferError::Connection {
            host: self.spec.host.clone(),
            port: self.spec.port,
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl<C: FtpTransport> RemoteOperations for FtpOperations<C> {
    type Meta = FtpMetadata;

    async fn connect(&mut self) -> Result<(), TransferError> {
        if self.client.is_connected() {
            return Ok(());
        }

        self.client
            .connect(&self.spec.host, self.spec.port, &self.options)
            .await
            .map_err(|e| self.connection_error(e))?;

        if let Some(policy) = &self.policy {
            self.client.apply_policy(policy);
        }

        let user = self.spec.username.as_deref().unwrap_or(ANONYMOUS_USER);
        let password = self.spec.password.as_deref().unwrap_or("");
        self.client
            .login(user, password)
            .await
            .map_err(|e| self.connection_error(e))?;

        debug!(
            host = %self.spec.host,
            port = self.spec.port,
            user,
            passive = self.options.passive,
            "ftp session established"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransferError> {
        if !self.client.is_connected() {
            return Ok(());
        }
        self.client
            .quit()
            .await
            .map_err(|e| self.connection_error(e))?;
        debug!(host = %self.spec.host, "ftp session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    async fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry<FtpMetadata>>, TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        let raw = self
            .client
            .list(path)
            .await
            .map_err(|e| TransferError::Listing {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(raw
            .into_iter()
            .map(|entry| RemoteEntry {
                native: Arc::new(FtpMetadata {
                    raw_listing: entry.raw,
                    is_dir: entry.is_dir,
                }),
                name: entry.name,
                size: entry.size,
                modified: entry.modified,
                is_dir: entry.is_dir,
            })
            .collect())
    }

    async fn retrieve(&mut self, path: &str) -> Result<Bytes, TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        self.client
            .retr(path)
            .await
            .map_err(|e| TransferError::Retrieval {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn store(&mut self, path: &str, body: Bytes) -> Result<(), TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        self.client
            .stor(path, body)
            .await
            .map_err(|e| TransferError::Delivery {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn delete(&mut self, path: &str) -> Result<(), TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        self.client
            .dele(path)
            .await
            .map_err(|e| TransferError::PostProcess {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        self.client
            .rename(from, to)
            .await
            .map_err(|e| TransferError::PostProcess {
                path: from.to_string(),
                reason: e.to_string(),
            })
    }

    async fn mkdirs(&mut self, path: &str) -> Result<(), TransferError> {
        if !self.client.is_connected() {
            return Err(TransferError::NotConnected);
        }
        // Walk down the tree; the native MKD primitive creates one level.
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            self.client
                .mkd(&prefix)
                .await
                .map_err(|e| TransferError::Delivery {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}
