//! Outbound producer.
//!
//! One message at a time: resolve the target path, create missing parent
//! directories when auto-create is on, stream the body through the
//! operations contract. Failures surface synchronously to the caller;
//! retry policy, if any, belongs to the surrounding pipeline.

use bytes::Bytes;
use tracing::debug;

use crate::error::TransferError;
use crate::ops::RemoteOperations;

/// One outbound message: a body plus an optional explicit file name.
///
/// With a file name, the endpoint path is the target directory; without
/// one, the endpoint path is taken as the full target path.
#[derive(Debug, Clone)]
pub struct OutboundFile {
    pub file_name: Option<String>,
    pub body: Bytes,
}

impl OutboundFile {
    pub fn named(file_name: impl Into<String>, body: Bytes) -> Self {
        Self {
            file_name: Some(file_name.into()),
            body,
        }
    }
}

pub struct ProducerConfig {
    /// Endpoint path: target directory, or full target path for unnamed
    /// messages.
    pub directory: String,
    pub auto_create: bool,
    pub keep_alive: bool,
}

pub struct RemoteFileProducer<O: RemoteOperations> {
    ops: O,
    config: ProducerConfig,
}

impl<O: RemoteOperations> RemoteFileProducer<O> {
    pub fn new(ops: O, config: ProducerConfig) -> Self {
        Self { ops, config }
    }

    /// Upload one message.
    ///
    /// `&mut self` gives the call exclusive use of the connection for its
    /// full duration. No internal retry: any failure comes straight back.
    pub async fn send(&mut self, message: OutboundFile) -> Result<(), TransferError> {
        let target = self.resolve_target(&message)?;
        let result = self.store(&target, message.body).await;

        if !self.config.keep_alive {
            if let Err(e) = self.ops.disconnect().await {
                debug!(error = %e, "disconnect after send failed");
            }
        }
        result
    }

    /// Close any open connection best-effort.
    pub async fn stop(&mut self) {
        if self.ops.is_connected() {
            if let Err(e) = self.ops.disconnect().await {
                debug!(error = %e, "disconnect on stop failed");
            }
        }
    }

    async fn store(&mut self, target: &str, body: Bytes) -> Result<(), TransferError> {
        if !self.ops.is_connected() {
            self.ops.connect().await?;
        }

        if self.config.auto_create {
            if let Some(parent) = parent_dir(target) {
                self.ops.mkdirs(parent).await?;
            }
        }

        let size = body.len();
        self.ops.store(target, body).await?;
        debug!(path = %target, size, "stored outbound file");
        Ok(())
    }

    fn resolve_target(&self, message: &OutboundFile) -> Result<String, TransferError> {
        let dir = self.config.directory.trim_end_matches('/');
        match message.file_name.as_deref() {
            Some(name) if !name.is_empty() => {
                if dir.is_empty() {
                    Ok(format!("/{name}"))
                } else {
                    Ok(format!("{dir}/{name}"))
                }
            }
            _ => {
                // Fall back to the endpoint path itself; it must point at a file.
                if dir.is_empty() || dir.ends_with('/') {
                    Err(TransferError::Delivery {
                        path: self.config.directory.clone(),
                        reason: "no target file name resolved".to_string(),
                    })
                } else {
                    Ok(dir.to_string())
                }
            }
        }
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/')
        .map(|idx| &path[..idx])
        .filter(|parent| !parent.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::ops::RemoteEntry;

    #[derive(Default)]
    struct RecordingOps {
        connected: bool,
        stored: HashMap<String, Bytes>,
        made_dirs: Vec<String>,
        fail_store: bool,
        disconnects: usize,
    }

    #[async_trait]
    impl RemoteOperations for RecordingOps {
        type Meta = ();

        async fn connect(&mut self) -> Result<(), TransferError> {
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), TransferError> {
            self.disconnects += 1;
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn list(&mut self, _path: &str) -> Result<Vec<RemoteEntry<()>>, TransferError> {
            Ok(vec![])
        }

        async fn retrieve(&mut self, path: &str) -> Result<Bytes, TransferError> {
            Err(TransferError::Retrieval {
                path: path.to_string(),
                reason: "not supported".to_string(),
            })
        }

        async fn store(&mut self, path: &str, body: Bytes) -> Result<(), TransferError> {
            if self.fail_store {
                return Err(TransferError::Delivery {
                    path: path.to_string(),
                    reason: "552 quota exceeded".to_string(),
                });
            }
            self.stored.insert(path.to_string(), body);
            Ok(())
        }

        async fn delete(&mut self, _path: &str) -> Result<(), TransferError> {
            Ok(())
        }

        async fn rename(&mut self, _from: &str, _to: &str) -> Result<(), TransferError> {
            Ok(())
        }

        async fn mkdirs(&mut self, path: &str) -> Result<(), TransferError> {
            self.made_dirs.push(path.to_string());
            Ok(())
        }
    }

    fn producer(config: ProducerConfig) -> RemoteFileProducer<RecordingOps> {
        RemoteFileProducer::new(RecordingOps::default(), config)
    }

    #[tokio::test]
    async fn test_send_stores_under_endpoint_directory() {
        let mut producer = producer(ProducerConfig {
            directory: "/out".to_string(),
            auto_create: true,
            keep_alive: true,
        });

        producer
            .send(OutboundFile::named("report.csv", Bytes::from_static(b"x,y")))
            .await
            .unwrap();

        assert_eq!(
            producer.ops.stored.get("/out/report.csv").map(|b| &b[..]),
            Some(&b"x,y"[..])
        );
        assert_eq!(producer.ops.made_dirs, vec!["/out".to_string()]);
    }

    #[tokio::test]
    async fn test_unnamed_message_targets_endpoint_path() {
        let mut producer = producer(ProducerConfig {
            directory: "/out/data.bin".to_string(),
            auto_create: false,
            keep_alive: true,
        });

        producer
            .send(OutboundFile {
                file_name: None,
                body: Bytes::from_static(b"payload"),
            })
            .await
            .unwrap();

        assert!(producer.ops.stored.contains_key("/out/data.bin"));
        assert!(producer.ops.made_dirs.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_a_delivery_error() {
        let mut producer = producer(ProducerConfig {
            directory: "/".to_string(),
            auto_create: false,
            keep_alive: true,
        });

        let err = producer
            .send(OutboundFile {
                file_name: None,
                body: Bytes::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Delivery { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_synchronously() {
        let mut producer = RemoteFileProducer::new(
            RecordingOps {
                fail_store: true,
                ..Default::default()
            },
            ProducerConfig {
                directory: "/out".to_string(),
                auto_create: false,
                keep_alive: true,
            },
        );

        let err = producer
            .send(OutboundFile::named("a.txt", Bytes::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Delivery { .. }));
    }

    #[tokio::test]
    async fn test_no_keep_alive_disconnects_after_send() {
        let mut producer = producer(ProducerConfig {
            directory: "/out".to_string(),
            auto_create: false,
            keep_alive: false,
        });

        producer
            .send(OutboundFile::named("a.txt", Bytes::new()))
            .await
            .unwrap();
        assert_eq!(producer.ops.disconnects, 1);
        assert!(!producer.ops.connected);
    }

    #[tokio::test]
    async fn test_concurrent_sends_on_independent_producers() {
        // Each producer owns its connection; concurrent sends must not
        // corrupt each other's content.
        let mut p1 = producer(ProducerConfig {
            directory: "/out".to_string(),
            auto_create: false,
            keep_alive: true,
        });
        let mut p2 = producer(ProducerConfig {
            directory: "/out".to_string(),
            auto_create: false,
            keep_alive: true,
        });

        let large_a = Bytes::from(vec![b'a'; 64 * 1024]);
        let large_b = Bytes::from(vec![b'b'; 64 * 1024]);

        let (ra, rb) = tokio::join!(
            p1.send(OutboundFile::named("a.bin", large_a.clone())),
            p2.send(OutboundFile::named("b.bin", large_b.clone())),
        );
        ra.unwrap();
        rb.unwrap();

        assert_eq!(p1.ops.stored.get("/out/a.bin"), Some(&large_a));
        assert_eq!(p2.ops.stored.get("/out/b.bin"), Some(&large_b));
    }

    #[test]
    fn test_parent_dir_resolution() {
        assert_eq!(parent_dir("/out/a.txt"), Some("/out"));
        assert_eq!(parent_dir("/a.txt"), None);
        assert_eq!(parent_dir("a.txt"), None);
    }
}
