//! Typed option targets and their strict binders.
//!
//! Each option category binds onto an explicit struct through a `from_map`
//! constructor: recognized keys are matched by name, values coerced
//! (string to int/bool/enum), and one unrecognized key fails the whole map
//! with [`ConfigError::UnknownOption`] before any connection attempt is
//! made. Callers treat binding as all-or-nothing: on failure the target is
//! discarded and startup fails.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn parse_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            expected: "true|false",
        }),
    }
}

fn parse_u64(option: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected: "an unsigned integer",
    })
}

fn parse_i64(option: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected: "an integer",
    })
}

fn parse_regex(option: &str, value: &str) -> Result<Regex, ConfigError> {
    Regex::new(value).map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected: "a valid regular expression",
    })
}

/// Control-channel encoding negotiated after connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlEncoding {
    Utf8,
    Ascii,
}

/// Options bound directly onto the protocol client before login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub passive: bool,
    pub binary: bool,
    pub control_encoding: ControlEncoding,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 30_000,
            read_timeout_ms: 30_000,
            passive: true,
            binary: true,
            control_encoding: ControlEncoding::Utf8,
        }
    }
}

impl ClientOptions {
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut opts = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "connect_timeout_ms" => opts.connect_timeout_ms = parse_u64(key, value)?,
                "read_timeout_ms" => opts.read_timeout_ms = parse_u64(key, value)?,
                "passive" => opts.passive = parse_bool(key, value)?,
                "binary" => opts.binary = parse_bool(key, value)?,
                "control_encoding" => {
                    opts.control_encoding = match value.as_str() {
                        "utf8" => ControlEncoding::Utf8,
                        "ascii" => ControlEncoding::Ascii,
                        _ => {
                            return Err(ConfigError::InvalidValue {
                                option: key.clone(),
                                value: value.clone(),
                                expected: "utf8|ascii",
                            })
                        }
                    }
                }
                _ => {
                    return Err(ConfigError::UnknownOption {
                        target: "client",
                        option: key.clone(),
                    })
                }
            }
        }
        Ok(opts)
    }
}

/// How the server formats its listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStyle {
    Unix,
    Msdos,
}

/// Server-behavior hints attached to the client when present.
///
/// The endpoint creates this object only if at least one `policy.*` option
/// was supplied; default behavior allocates nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpPolicy {
    /// Offset of the server clock from UTC, applied to listing timestamps.
    pub server_tz_offset_secs: i64,
    pub listing_style: ListingStyle,
    pub ignore_hidden: bool,
}

impl Default for FtpPolicy {
    fn default() -> Self {
        Self {
            server_tz_offset_secs: 0,
            listing_style: ListingStyle::Unix,
            ignore_hidden: false,
        }
    }
}

impl FtpPolicy {
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut policy = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "server_tz_offset_secs" => {
                    policy.server_tz_offset_secs = parse_i64(key, value)?
                }
                "listing_style" => {
                    policy.listing_style = match value.as_str() {
                        "unix" => ListingStyle::Unix,
                        "msdos" => ListingStyle::Msdos,
                        _ => {
                            return Err(ConfigError::InvalidValue {
                                option: key.clone(),
                                value: value.clone(),
                                expected: "unix|msdos",
                            })
                        }
                    }
                }
                "ignore_hidden" => policy.ignore_hidden = parse_bool(key, value)?,
                _ => {
                    return Err(ConfigError::UnknownOption {
                        target: "policy",
                        option: key.clone(),
                    })
                }
            }
        }
        Ok(policy)
    }
}

/// Action applied to the source entry after successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "action")]
pub enum PostAction {
    None,
    Delete,
    /// Move into a directory, created on demand. Relative targets resolve
    /// under the polled directory.
    Move { to: String },
    /// Rename within the directory; `{name}` expands to the file name.
    Rename { to: String },
}

/// Endpoint-level settings bound from the unprefixed options.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    /// Poll cadence in milliseconds.
    pub delay_ms: u64,
    /// Whether the connection persists across poll cycles.
    pub keep_alive: bool,
    /// Whether the producer creates missing parent directories.
    pub auto_create: bool,
    /// Accept predicate over file names, evaluated before retrieval.
    pub include: Option<Regex>,
    /// Reject predicate over file names; rejected entries are dropped
    /// silently.
    pub exclude: Option<Regex>,
    pub post_action: PostAction,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            keep_alive: true,
            auto_create: true,
            include: None,
            exclude: None,
            post_action: PostAction::None,
        }
    }
}

impl EndpointSettings {
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        let mut action: Option<String> = None;
        let mut move_to: Option<String> = None;
        let mut rename_to: Option<String> = None;

        for (key, value) in map {
            match key.as_str() {
                "delay" => settings.delay_ms = parse_u64(key, value)?,
                "keep_alive" => settings.keep_alive = parse_bool(key, value)?,
                "auto_create" => settings.auto_create = parse_bool(key, value)?,
                "include" => settings.include = Some(parse_regex(key, value)?),
                "exclude" => settings.exclude = Some(parse_regex(key, value)?),
                "post_action" => action = Some(value.clone()),
                "move_to" => move_to = Some(value.clone()),
                "rename_to" => rename_to = Some(value.clone()),
                _ => {
                    return Err(ConfigError::UnknownOption {
                        target: "endpoint",
                        option: key.clone(),
                    })
                }
            }
        }

        settings.post_action = match action.as_deref() {
            None | Some("none") => PostAction::None,
            Some("delete") => PostAction::Delete,
            Some("move") => PostAction::Move {
                to: move_to.ok_or(ConfigError::InvalidValue {
                    option: "post_action".to_string(),
                    value: "move".to_string(),
                    expected: "`move_to` to be set as well",
                })?,
            },
            Some("rename") => PostAction::Rename {
                to: rename_to.ok_or(ConfigError::InvalidValue {
                    option: "post_action".to_string(),
                    value: "rename".to_string(),
                    expected: "`rename_to` to be set as well",
                })?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    option: "post_action".to_string(),
                    value: other.to_string(),
                    expected: "none|move|delete|rename",
                })
            }
        };

        Ok(settings)
    }
}
