//! Polling consumer.
//!
//! One `poll_once` call runs a full cycle:
//! connect -> list -> filter -> retrieve each entry -> deliver ->
//! post-process, then disconnect unless keep-alive holds the session
//! open. A retrieval failure is contained to its entry; a listing failure
//! aborts only the current cycle. `&mut self` guarantees cycles of one
//! consumer never overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::file::{GenericFile, InMemoryBinding, RemoteFile};
use crate::ops::{RemoteEntry, RemoteOperations};
use crate::options::{EndpointSettings, PostAction};
use crate::sink::{DeliverySink, FileMessage};

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollStats {
    /// Entries the listing returned.
    pub listed: u64,
    /// Entries that survived filtering.
    pub accepted: u64,
    /// Messages delivered downstream.
    pub files_ok: u64,
    /// Entries that failed retrieval or were rejected by the pipeline.
    pub files_err: u64,
    pub bytes_transferred: u64,
    pub post_failures: u64,
}

/// Cooperative stop signal shared with whatever drives the consumer.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ConsumerConfig {
    /// Remote directory to poll.
    pub directory: String,
    /// Host stamped onto every emitted file.
    pub hostname: String,
    pub settings: EndpointSettings,
}

pub struct RemoteFileConsumer<O: RemoteOperations> {
    ops: O,
    config: ConsumerConfig,
    sink: Arc<dyn DeliverySink<O::Meta>>,
    cancel: CancelHandle,
}

impl<O: RemoteOperations> std::fmt::Debug for RemoteFileConsumer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFileConsumer")
            .field("directory", &self.config.directory)
            .field("hostname", &self.config.hostname)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl<O: RemoteOperations> RemoteFileConsumer<O> {
    pub fn new(ops: O, config: ConsumerConfig, sink: Arc<dyn DeliverySink<O::Meta>>) -> Self {
        Self {
            ops,
            config,
            sink,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for stopping this consumer from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one poll cycle.
    ///
    /// Every contained failure is routed to the sink's `report_error`
    /// exactly once; the returned stats describe what the cycle did. A
    /// cycle never panics its schedule away: connect and listing failures
    /// abort this invocation only.
    pub async fn poll_once(&mut self) -> PollStats {
        let mut stats = PollStats::default();

        if !self.ops.is_connected() {
            if let Err(e) = self.ops.connect().await {
                warn!(error = %e, "poll cycle aborted: connect failed");
                self.sink.report_error(e).await;
                return stats;
            }
        }

        let entries = match self.ops.list(&self.config.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(directory = %self.config.directory, error = %e, "poll cycle aborted: listing failed");
                self.sink.report_error(e).await;
                self.finish_cycle().await;
                return stats;
            }
        };
        stats.listed = entries.len() as u64;

        // Rejected entries are dropped silently: not forwarded, not retried.
        let accepted: Vec<RemoteEntry<O::Meta>> =
            entries.into_iter().filter(|e| self.accepts(e)).collect();
        stats.accepted = accepted.len() as u64;

        for entry in accepted {
            if self.cancel.is_cancelled() {
                debug!("cycle interrupted by cancellation");
                break;
            }

            let path = self.remote_path(&entry.name);
            let body = match self.ops.retrieve(&path).await {
                Ok(body) => body,
                Err(e) => {
                    // Contained to this entry; the rest of the batch still runs.
                    stats.files_err += 1;
                    warn!(path = %path, error = %e, "entry retrieval failed, continuing");
                    self.sink.report_error(e).await;
                    continue;
                }
            };

            let file = self.build_file(&entry, &path, body.clone());
            let message = FileMessage {
                file,
                body: body.clone(),
            };

            match self.sink.deliver(message).await {
                Ok(()) => {
                    stats.files_ok += 1;
                    stats.bytes_transferred += body.len() as u64;
                    if let Err(e) = self.post_process(&entry.name, &path).await {
                        // The delivered message stands.
                        stats.post_failures += 1;
                        warn!(path = %path, error = %e, "post-processing failed");
                        self.sink.report_error(e).await;
                    }
                }
                Err(e) => {
                    // The pipeline saw its own failure; the source entry is
                    // left in place for the next cycle.
                    stats.files_err += 1;
                    warn!(path = %path, error = %e, "pipeline rejected message");
                }
            }
        }

        self.finish_cycle().await;
        info!(
            directory = %self.config.directory,
            listed = stats.listed,
            accepted = stats.accepted,
            ok = stats.files_ok,
            err = stats.files_err,
            "poll cycle complete"
        );
        stats
    }

    /// Drive the consumer on its configured cadence until cancelled.
    ///
    /// Cycle n+1 never starts before cycle n completes; a cancelled
    /// consumer skips its next cycle and closes the connection.
    pub async fn run(&mut self) {
        let period = Duration::from_millis(self.config.settings.delay_ms.max(1));
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            if self.cancel.is_cancelled() {
                break;
            }
            self.poll_once().await;
        }
        self.stop().await;
    }

    /// Stop this consumer: no further cycles start, and any open
    /// connection is closed best-effort.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if self.ops.is_connected() {
            if let Err(e) = self.ops.disconnect().await {
                debug!(error = %e, "disconnect on stop failed");
            }
        }
    }

    fn accepts(&self, entry: &RemoteEntry<O::Meta>) -> bool {
        if entry.is_dir {
            return false;
        }
        // A nameless observation can never satisfy the forwarding invariant.
        if entry.name.is_empty() {
            return false;
        }
        if let Some(include) = &self.config.settings.include {
            if !include.is_match(&entry.name) {
                return false;
            }
        }
        if let Some(exclude) = &self.config.settings.exclude {
            if exclude.is_match(&entry.name) {
                return false;
            }
        }
        true
    }

    fn remote_path(&self, name: &str) -> String {
        let dir = self.config.directory.trim_end_matches('/');
        if dir.is_empty() {
            format!("/{name}")
        } else {
            format!("{dir}/{name}")
        }
    }

    fn build_file(
        &self,
        entry: &RemoteEntry<O::Meta>,
        path: &str,
        body: Bytes,
    ) -> RemoteFile<O::Meta> {
        let mut file = GenericFile::new();
        file.absolute = true;
        file.absolute_path = path.to_string();
        file.relative_path = entry.name.clone();
        file.file_name = entry.name.clone();
        file.file_length = entry.size;
        file.last_modified = entry.modified;
        file.native = Some(entry.native.clone());
        file.set_binding(Arc::new(InMemoryBinding(body)));
        RemoteFile::new(file, self.config.hostname.clone())
    }

    async fn post_process(&mut self, name: &str, path: &str) -> Result<(), TransferError> {
        let action = self.config.settings.post_action.clone();
        match action {
            PostAction::None => Ok(()),
            PostAction::Delete => self.ops.delete(path).await,
            PostAction::Move { to } => {
                let target_dir = if to.starts_with('/') {
                    to.trim_end_matches('/').to_string()
                } else {
                    let dir = self.config.directory.trim_end_matches('/');
                    format!("{dir}/{}", to.trim_end_matches('/'))
                };
                self.ops.mkdirs(&target_dir).await.map_err(|e| {
                    TransferError::PostProcess {
                        path: path.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                self.ops.rename(path, &format!("{target_dir}/{name}")).await
            }
            PostAction::Rename { to } => {
                let target = self.remote_path(&to.replace("{name}", name));
                self.ops.rename(path, &target).await
            }
        }
    }

    async fn finish_cycle(&mut self) {
        if self.config.settings.keep_alive {
            return;
        }
        if let Err(e) = self.ops.disconnect().await {
            debug!(error = %e, "disconnect after cycle failed");
        }
    }
}
