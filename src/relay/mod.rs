// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Core
//!
//! Friendship-gated message routing between live connections.
//!
//! - `registry` - identity to live connection, with a reverse link per
//!   connection so disconnects release the right entry
//! - `mirror` - friend lists as last reported by each client
//! - `engine` - event handling and the mutual-friendship check
//! - `protocol` - JSON event envelopes carried over the socket
//!
//! All state is in memory and lost on restart.

pub mod engine;
pub mod error;
pub mod mirror;
pub mod protocol;
pub mod registry;

pub use engine::{RelayEngine, RouteOutcome};
pub use error::{BlockReason, RelayError};
pub use mirror::FriendMirror;
pub use protocol::{BlockedNotice, ChatMessage, ClientEvent, FriendsUpdate, ServerEvent};
pub use registry::{ConnectionHandle, ConnectionRegistry};
