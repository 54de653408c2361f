// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay errors and routing refusals.

use serde::Serialize;

/// Boundary errors raised while decoding inbound events.
///
/// None of these close the connection: the offending frame is logged and
/// dropped.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RelayError {
    /// Frame is not a well-formed event envelope or payload.
    #[error("malformed event: {0}")]
    MalformedEvent(String),
    /// Address is empty after normalization.
    #[error("invalid identity {0:?}")]
    InvalidIdentity(String),
}

/// Why a message was refused by the friendship check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Sender or receiver has never pushed a friend list.
    #[error("friend list unknown for sender or receiver")]
    UnknownFriendState,
    /// Both friend lists are known but do not list each other.
    #[error("sender and receiver are not mutual friends")]
    NotMutualFriends,
}

impl BlockReason {
    /// Stable code used in logs and `messageBlocked` events.
    pub fn code(&self) -> &'static str {
        match self {
            BlockReason::UnknownFriendState => "unknown_friend_state",
            BlockReason::NotMutualFriends => "not_mutual_friends",
        }
    }
}
