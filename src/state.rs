// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{config::RelayConfig, relay::RelayEngine};

#[derive(Clone)]
pub struct AppState {
    pub relay: RelayEngine,
    pub config: Arc<RelayConfig>,
    pub connections: ConnectionTracker,
    /// Cancelled on shutdown; open socket loops exit when it fires.
    pub shutdown: CancellationToken,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: RelayEngine::new(config.notify_blocked),
            connections: ConnectionTracker::new(config.max_connections),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

/// Counts open sockets against the configured cap.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    live: Arc<AtomicUsize>,
    max: usize,
}

impl ConnectionTracker {
    pub fn new(max: usize) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Reserve a slot, or `None` if the cap is reached.
    pub fn try_acquire(&self) -> Option<ConnectionSlot> {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()?;
        Some(ConnectionSlot {
            live: Arc::clone(&self.live),
        })
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// Held for the lifetime of one socket; releases its slot on drop.
#[derive(Debug)]
pub struct ConnectionSlot {
    live: Arc<AtomicUsize>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_enforces_cap_and_releases_on_drop() {
        let tracker = ConnectionTracker::new(2);
        let first = tracker.try_acquire().unwrap();
        let _second = tracker.try_acquire().unwrap();
        assert!(tracker.try_acquire().is_none());
        assert_eq!(tracker.live(), 2);

        drop(first);
        assert_eq!(tracker.live(), 1);
        assert!(tracker.try_acquire().is_some());
    }

    #[test]
    fn state_follows_config() {
        let state = AppState::new(RelayConfig {
            max_connections: 3,
            ..RelayConfig::default()
        });
        assert_eq!(state.connections.max(), 3);
        assert!(!state.shutdown.is_cancelled());
    }
}
