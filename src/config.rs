// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the relay. Configuration is loaded from the environment once
//! at startup into a [`RelayConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `CLIENT_URL` | Allowed CORS origin for the web client | Permissive CORS |
//! | `RELAY_MAX_CONNECTIONS` | Maximum concurrent WebSocket connections | `10000` |
//! | `RELAY_OUTBOUND_QUEUE` | Events buffered per connection before copies are dropped | `256` |
//! | `RELAY_NOTIFY_BLOCKED` | Send `messageBlocked` back to the sender | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;

use axum::http::HeaderValue;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the allowed cross-origin client URL.
///
/// When unset, the relay answers CORS preflights permissively.
pub const CLIENT_URL_ENV: &str = "CLIENT_URL";

/// Environment variable name for the live connection cap.
pub const MAX_CONNECTIONS_ENV: &str = "RELAY_MAX_CONNECTIONS";

/// Environment variable name for the per-connection outbound queue size.
///
/// A peer that stops reading gets at most this many events buffered; further
/// copies are dropped.
pub const OUTBOUND_QUEUE_ENV: &str = "RELAY_OUTBOUND_QUEUE";

/// Environment variable name for the blocked-message notification switch.
///
/// Off by default: a refused message is dropped silently, the same as a
/// message to an offline friend.
pub const NOTIFY_BLOCKED_ENV: &str = "RELAY_NOTIFY_BLOCKED";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
}

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Relay settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by the CORS layer. `None` means permissive.
    pub allowed_origin: Option<HeaderValue>,
    pub max_connections: usize,
    /// Capacity of each connection's outbound queue. Always at least 1.
    pub outbound_queue: usize,
    pub notify_blocked: bool,
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            notify_blocked: false,
            log_format: LogFormat::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(HOST_ENV) {
            config.host = host;
        }

        if let Some(port) = get(PORT_ENV) {
            config.port = parse_value(PORT_ENV, &port)?;
        }

        if let Some(origin) = get(CLIENT_URL_ENV) {
            let origin = HeaderValue::from_str(origin.trim()).map_err(|_| {
                ConfigError::InvalidValue {
                    name: CLIENT_URL_ENV,
                    value: origin.clone(),
                }
            })?;
            config.allowed_origin = Some(origin);
        }

        if let Some(max) = get(MAX_CONNECTIONS_ENV) {
            config.max_connections = parse_value(MAX_CONNECTIONS_ENV, &max)?;
        }

        if let Some(capacity) = get(OUTBOUND_QUEUE_ENV) {
            config.outbound_queue = parse_value(OUTBOUND_QUEUE_ENV, &capacity)?;
            if config.outbound_queue == 0 {
                return Err(ConfigError::InvalidValue {
                    name: OUTBOUND_QUEUE_ENV,
                    value: capacity,
                });
            }
        }

        if let Some(flag) = get(NOTIFY_BLOCKED_ENV) {
            config.notify_blocked = parse_flag(NOTIFY_BLOCKED_ENV, &flag)?;
        }

        if let Some(format) = get(LOG_FORMAT_ENV) {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: LOG_FORMAT_ENV,
                        value: format,
                    })
                }
            };
        }

        Ok(config)
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidBindAddress(addr))
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
        }),
    }
}
