// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Data Models
//!
//! Shared types used by the relay core and the HTTP surface.
//!
//! ## Identity Type
//!
//! The [`Identity`] newtype wraps a wallet address in its normalized form
//! (trimmed, lower-cased). Every map in the relay is keyed by it, so two
//! spellings of the same address can never produce two entries.
//!
//! ## Model Categories
//!
//! - **Identity / ConnectionId**: keys of the relay maps
//! - **Stats**: response body of `GET /v1/relay/stats`

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::relay::RelayError;

// =============================================================================
// Identity Type
// =============================================================================

/// Normalized wallet address identifying a user.
///
/// Construction always lower-cases and trims, so equality is
/// case-insensitive with respect to the raw address.
///
/// # Example
///
/// ```rust,ignore
/// let a = Identity::parse("0xAbC")?;
/// assert_eq!(a, Identity::parse(" 0xabc ")?);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Normalize a raw address. Fails only for an empty address.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(RelayError::InvalidIdentity(raw.to_string()));
        }
        Ok(Identity(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identity::parse(&value)
    }
}

impl TryFrom<&str> for Identity {
    type Error = RelayError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Identity::parse(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

// =============================================================================
// Connection Id
// =============================================================================

/// Opaque per-connection handle id, assigned when a socket is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Stats Models
// =============================================================================

/// Snapshot of relay occupancy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RelayStats {
    /// Identities currently bound to a live connection.
    pub registered_identities: usize,
    /// Identities with a friend list on record.
    pub friend_mirrors: usize,
    /// Open WebSocket connections, registered or not.
    pub live_connections: usize,
    /// Configured connection cap.
    pub max_connections: usize,
    /// Process start time (RFC 3339).
    pub started_at: String,
    /// Seconds since process start.
    pub uptime_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_case_and_whitespace_insensitive() {
        let upper = Identity::parse("0xABCdef0123").unwrap();
        let lower = Identity::parse("  0xabcdef0123\n").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "0xabcdef0123");
    }

    #[test]
    fn empty_identity_is_rejected() {
        assert!(matches!(
            Identity::parse("   "),
            Err(RelayError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn identity_deserializes_normalized() {
        let id: Identity = serde_json::from_str(r#""0xDEADbeef""#).unwrap();
        assert_eq!(id.to_string(), "0xdeadbeef");
        assert!(serde_json::from_str::<Identity>(r#""""#).is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""0xdeadbeef""#);
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
