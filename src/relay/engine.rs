// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Engine
//!
//! Applies inbound events to the connection registry and the friend mirror,
//! and forwards chat messages between mutual friends.
//!
//! ## Routing
//!
//! 1. Both identities must have a friend list on record, otherwise the
//!    message is blocked with [`BlockReason::UnknownFriendState`].
//! 2. Each must list the other, otherwise [`BlockReason::NotMutualFriends`].
//! 3. One copy goes to each side that is currently connected. Offline sides
//!    are skipped; nothing is queued or retried.
//!
//! A message that passes the check is reported as delivered whether zero,
//! one or two copies were actually sent.
//!
//! ## Locking
//!
//! The registry and the mirror sit behind separate `RwLock`s. No operation
//! holds both at once, and no lock is held while a socket is written.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::BlockReason;
use super::mirror::FriendMirror;
use super::protocol::{BlockedNotice, ChatMessage, ClientEvent, ServerEvent};
use super::registry::{ConnectionHandle, ConnectionRegistry};
use crate::models::{ConnectionId, Identity};

/// Result of routing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The friendship check passed; `copies` events were queued.
    Delivered { copies: usize },
    Blocked(BlockReason),
}

#[derive(Clone, Default)]
pub struct RelayEngine {
    registry: Arc<RwLock<ConnectionRegistry>>,
    mirror: Arc<RwLock<FriendMirror>>,
    notify_blocked: bool,
}

impl RelayEngine {
    /// Create an empty engine.
    ///
    /// With `notify_blocked` set, a refused sender gets a `messageBlocked`
    /// event on its own connection instead of silence.
    pub fn new(notify_blocked: bool) -> Self {
        Self {
            notify_blocked,
            ..Self::default()
        }
    }

    /// Apply one inbound event from `connection`.
    pub async fn handle_event(&self, connection: &ConnectionHandle, event: ClientEvent) {
        match event {
            ClientEvent::RegisterUser(identity) => self.register(identity, connection.clone()).await,
            ClientEvent::UpdateFriendsList(update) => {
                self.update_friends(update.user_address, update.friends).await
            }
            ClientEvent::SendMessage(message) => {
                if let RouteOutcome::Blocked(reason) = self.route_message(&message).await {
                    if self.notify_blocked {
                        connection.send(ServerEvent::MessageBlocked(BlockedNotice {
                            receiver: message.receiver,
                            reason,
                        }));
                    }
                }
            }
        }
    }

    pub async fn register(&self, identity: Identity, connection: ConnectionHandle) {
        let connection_id = connection.id();
        let superseded = self
            .registry
            .write()
            .await
            .register(identity.clone(), connection);

        match superseded {
            Some(previous) => info!(
                identity = %identity,
                connection_id = %connection_id,
                previous_connection_id = %previous,
                "Registered user, replacing earlier connection"
            ),
            None => info!(
                identity = %identity,
                connection_id = %connection_id,
                "Registered user"
            ),
        }
    }

    /// Release whatever identity `connection` registered.
    pub async fn unregister(&self, connection: ConnectionId) -> Option<Identity> {
        let released = self.registry.write().await.unregister(connection);
        if let Some(identity) = &released {
            info!(identity = %identity, connection_id = %connection, "Unregistered user");
        }
        released
    }

    pub async fn lookup(&self, identity: &Identity) -> Option<ConnectionHandle> {
        self.registry.read().await.lookup(identity).cloned()
    }

    pub async fn update_friends<I>(&self, identity: Identity, friends: I)
    where
        I: IntoIterator<Item = Identity>,
    {
        let mut mirror = self.mirror.write().await;
        mirror.update(identity.clone(), friends);
        let count = mirror.friends_of(&identity).map_or(0, |set| set.len());
        info!(identity = %identity, friends = count, "Updated friends list");
    }

    pub async fn route_message(&self, message: &ChatMessage) -> RouteOutcome {
        let sender = &message.sender;
        let receiver = &message.receiver;

        if let Err(reason) = self.mirror.read().await.check_mutual(sender, receiver) {
            warn!(
                sender = %sender,
                receiver = %receiver,
                reason = reason.code(),
                "Blocking message"
            );
            return RouteOutcome::Blocked(reason);
        }

        let (sender_conn, receiver_conn) = {
            let registry = self.registry.read().await;
            (
                registry.lookup(sender).cloned(),
                registry.lookup(receiver).cloned(),
            )
        };

        let event = ServerEvent::PrivateMessage(message.payload.clone());
        let mut copies = 0;

        match &sender_conn {
            Some(conn) => copies += deliver(conn, &event),
            None => debug!(sender = %sender, "Sender connection not found"),
        }

        match receiver_conn {
            // A self-addressed message reaches its connection once.
            Some(conn) if sender_conn.as_ref().map(|s| s.id()) == Some(conn.id()) => {}
            Some(conn) => copies += deliver(&conn, &event),
            None => debug!(receiver = %receiver, "Receiver connection not found"),
        }

        debug!(sender = %sender, receiver = %receiver, copies, "Routed message");
        RouteOutcome::Delivered { copies }
    }

    pub async fn registered_count(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn mirror_count(&self) -> usize {
        self.mirror.read().await.len()
    }
}

fn deliver(connection: &ConnectionHandle, event: &ServerEvent) -> usize {
    usize::from(connection.send(event.clone()))
}
