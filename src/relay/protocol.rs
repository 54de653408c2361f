// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Protocol
//!
//! Every WebSocket text frame carries one JSON envelope:
//!
//! ```text
//! {"event": "<name>", "data": <payload>}
//! ```
//!
//! | Direction | Event | Data |
//! |-----------|-------|------|
//! | in | `registerUser` | `"0x.."` or `{"identity": "0x.."}` |
//! | in | `updateFriendsList` | `{"userAddress": "0x..", "friends": ["0x..", ..]}` |
//! | in | `sendMessage` | `{"sender": "0x..", "receiver": "0x..", ..}` |
//! | out | `privateMessage` | the `sendMessage` data, verbatim |
//! | out | `messageBlocked` | `{"receiver": "0x..", "reason": "not_mutual_friends"}` |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BlockReason, RelayError};
use crate::models::Identity;

pub const REGISTER_USER: &str = "registerUser";
pub const UPDATE_FRIENDS_LIST: &str = "updateFriendsList";
pub const SEND_MESSAGE: &str = "sendMessage";

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Announcement {
    Bare(Identity),
    Object { identity: Identity },
}

/// Friend list snapshot pushed by a client.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FriendsUpdate {
    pub user_address: Identity,
    pub friends: Vec<Identity>,
}

#[derive(Deserialize)]
struct Addressing {
    sender: Identity,
    receiver: Identity,
}

/// A chat message in flight.
///
/// `payload` is the original `sendMessage` object, including the raw
/// (non-normalized) `sender` and `receiver` fields and whatever content the
/// client attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Identity,
    pub receiver: Identity,
    pub payload: Value,
}

impl ChatMessage {
    /// Build a message from a `sendMessage` payload.
    pub fn from_payload(payload: Value) -> Result<Self, RelayError> {
        if !payload.is_object() {
            return Err(RelayError::MalformedEvent(
                "sendMessage data must be an object".to_string(),
            ));
        }
        let addressing: Addressing = serde_json::from_value(payload.clone()).map_err(malformed)?;
        Ok(Self {
            sender: addressing.sender,
            receiver: addressing.receiver,
            payload,
        })
    }
}

/// Inbound event, already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    RegisterUser(Identity),
    UpdateFriendsList(FriendsUpdate),
    SendMessage(ChatMessage),
}

impl ClientEvent {
    /// Decode one text frame.
    pub fn parse(frame: &str) -> Result<Self, RelayError> {
        let Envelope { event, data } = serde_json::from_str::<Envelope>(frame).map_err(malformed)?;

        match event.as_str() {
            REGISTER_USER => {
                let announcement: Announcement =
                    serde_json::from_value(data).map_err(malformed)?;
                let (Announcement::Bare(identity) | Announcement::Object { identity }) =
                    announcement;
                Ok(ClientEvent::RegisterUser(identity))
            }
            UPDATE_FRIENDS_LIST => Ok(ClientEvent::UpdateFriendsList(
                serde_json::from_value(data).map_err(malformed)?,
            )),
            SEND_MESSAGE => Ok(ClientEvent::SendMessage(ChatMessage::from_payload(data)?)),
            other => Err(RelayError::MalformedEvent(format!("unknown event {other:?}"))),
        }
    }
}

/// Data of a `messageBlocked` event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockedNotice {
    pub receiver: Identity,
    pub reason: BlockReason,
}

/// Outbound event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    PrivateMessage(Value),
    MessageBlocked(BlockedNotice),
}

fn malformed(err: serde_json::Error) -> RelayError {
    RelayError::MalformedEvent(err.to_string())
}
