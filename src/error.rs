//! Error taxonomy for the endpoint core.
//!
//! Startup-time failures (`ConfigError`, `StartupError`) are fatal: routes
//! fail before any network I/O instead of degrading silently. Transfer-time
//! failures carry their containment scope: `Connection` and `Listing` abort
//! at most one poll cycle, `Retrieval` is contained to a single entry.

use std::fmt;

use thiserror::Error;

/// Option-binding and address-parsing failures, raised before any
/// connection attempt.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Binding is strict: one unrecognized key fails the whole map.
    #[error("unknown {target} option `{option}`")]
    UnknownOption {
        /// Which binding target rejected the key (`client`, `policy`, `endpoint`).
        target: &'static str,
        option: String,
    },

    #[error("invalid value `{value}` for option `{option}`: expected {expected}")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid endpoint address `{uri}`: {reason}")]
    InvalidAddress { uri: String, reason: String },
}

/// Which half of an endpoint failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Consumer,
    Producer,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Consumer => write!(f, "consumer"),
            EndpointRole::Producer => write!(f, "producer"),
        }
    }
}

/// Consumer or producer construction failure, wrapping its cause.
///
/// Construction runs once at route startup; these are never retried.
#[derive(Debug, Clone, Error)]
#[error("failed to create {role} for {address}")]
pub struct StartupError {
    pub role: EndpointRole,
    pub address: String,
    #[source]
    pub source: ConfigError,
}

/// Transfer-time failures.
///
/// Reason strings carry whatever the native client reported; the variant
/// carries the operation context so a report is actionable on its own.
#[derive(Debug, Clone, Error)]
pub enum TransferError {
    /// Connect or authentication failure. The scheduler retries on the
    /// next cycle, never within the current one.
    #[error("connection to {host}:{port} failed: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    /// Directory-listing failure. Aborts the current poll cycle only.
    #[error("listing {path} failed: {reason}")]
    Listing { path: String, reason: String },

    /// Per-entry retrieval failure, contained to that entry.
    #[error("retrieving {path} failed: {reason}")]
    Retrieval { path: String, reason: String },

    /// Store failure, surfaced synchronously to the producer's caller.
    #[error("storing {path} failed: {reason}")]
    Delivery { path: String, reason: String },

    /// Post-processing failure. Reported, but the already-delivered
    /// message stands.
    #[error("post-processing {path} failed: {reason}")]
    PostProcess { path: String, reason: String },

    /// An operation was invoked without a live connection.
    #[error("not connected")]
    NotConnected,
}
