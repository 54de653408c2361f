// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connection registry: identity to live connection.
//!
//! The registry keeps a reverse link from each connection to the identity it
//! registered, so a disconnect removes exactly that connection's entry and
//! never an entry a newer connection took over.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use super::protocol::ServerEvent;
use crate::models::{ConnectionId, Identity};

/// Send side of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event for the connection's writer without waiting.
    ///
    /// Returns `false` and drops the event if the queue is full (the peer
    /// stopped reading) or the writer has already gone away.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(connection_id = %self.id, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection_id = %self.id, "Connection writer closed, dropping event");
                false
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_identity: HashMap<Identity, ConnectionHandle>,
    by_connection: HashMap<ConnectionId, Identity>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to `handle`, replacing any earlier binding.
    ///
    /// Returns the id of a different connection that previously held this
    /// identity, if any. A connection that re-announces under a new identity
    /// releases its old one first.
    pub fn register(&mut self, identity: Identity, handle: ConnectionHandle) -> Option<ConnectionId> {
        let id = handle.id();

        if self
            .by_connection
            .get(&id)
            .is_some_and(|bound| bound != &identity)
        {
            self.unregister(id);
        }

        let superseded = self
            .by_identity
            .insert(identity.clone(), handle)
            .map(|previous| previous.id())
            .filter(|previous| *previous != id);

        if let Some(previous) = superseded {
            self.by_connection.remove(&previous);
        }
        self.by_connection.insert(id, identity);

        superseded
    }

    pub fn lookup(&self, identity: &Identity) -> Option<&ConnectionHandle> {
        self.by_identity.get(identity)
    }

    /// Drop the entry owned by `connection`.
    ///
    /// Returns the identity that was released. Unknown or superseded
    /// connections are a no-op.
    pub fn unregister(&mut self, connection: ConnectionId) -> Option<Identity> {
        let identity = self.by_connection.remove(&connection)?;
        if self
            .by_identity
            .get(&identity)
            .is_some_and(|handle| handle.id() == connection)
        {
            self.by_identity.remove(&identity);
        }
        Some(identity)
    }

    /// Identity currently bound to `connection`.
    pub fn identity_of(&self, connection: ConnectionId) -> Option<&Identity> {
        self.by_connection.get(&connection)
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }
}
