//! Remote-file endpoints for message pipelines.
//!
//! Treats files sitting on a remote server as ordinary inbound/outbound
//! messages, independent of the wire protocol that moves them.
//!
//! # Architecture
//!
//! ```text
//! address --> FtpEndpoint --> FtpOperations --> RemoteFileConsumer --> sink
//!              (bind)           (adapt)     \       (poll cycle)
//!                                            --> RemoteFileProducer
//!                                                 (per-message store)
//! ```
//!
//! The wire protocol lives behind [`ops::ftp::FtpTransport`]; everything
//! above it is protocol-agnostic. [`ops::RemoteOperations`] is the
//! capability contract a binding implements, [`file::RemoteFile`] the
//! shared metadata model every binding emits.
//!
//! Polling semantics in one line: a cycle lists, filters, retrieves each
//! accepted entry in order, delivers, and post-processes; a failed entry
//! never aborts the batch, a failed listing aborts only its own cycle.

pub mod consumer;
pub mod endpoint;
pub mod error;
pub mod file;
pub mod ops;
pub mod options;
pub mod producer;
pub mod sink;
pub mod uri;

pub use consumer::{CancelHandle, ConsumerConfig, PollStats, RemoteFileConsumer};
pub use endpoint::FtpEndpoint;
pub use error::{ConfigError, EndpointRole, StartupError, TransferError};
pub use file::{ContentBinding, GenericFile, InMemoryBinding, RemoteFile};
pub use ops::ftp::{
    ConnectSpec, FtpListEntry, FtpMetadata, FtpOperations, FtpTransport, ANONYMOUS_USER,
};
pub use ops::{RemoteEntry, RemoteOperations};
pub use options::{
    ClientOptions, ControlEncoding, EndpointSettings, FtpPolicy, ListingStyle, PostAction,
};
pub use producer::{OutboundFile, ProducerConfig, RemoteFileProducer};
pub use sink::{DeliverySink, FileMessage};
pub use uri::EndpointAddress;
