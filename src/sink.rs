//! Pipeline delivery contract.
//!
//! The surrounding message pipeline is an external collaborator; the core
//! needs exactly two calls from it: hand a message over, and observe a
//! contained failure. Nothing else of a routing engine is assumed.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransferError;
use crate::file::RemoteFile;

/// One inbound message: a remote file observation plus its realized body.
pub struct FileMessage<M> {
    pub file: RemoteFile<M>,
    pub body: Bytes,
}

/// Downstream delivery contract implemented by the pipeline.
#[async_trait]
pub trait DeliverySink<M: Send>: Send + Sync {
    /// Hand one message to the pipeline. An `Err` means the pipeline
    /// rejected the message; the source entry is left in place for the
    /// next cycle.
    async fn deliver(&self, message: FileMessage<M>) -> anyhow::Result<()>;

    /// Observe a failure the consumer contained (cycle- or entry-scoped).
    /// Invoked exactly once per failure.
    async fn report_error(&self, error: TransferError);
}
