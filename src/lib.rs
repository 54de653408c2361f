// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Friendgate Relay - Friendship-Gated Message Relay
//!
//! Real-time message router for an on-chain social network. Clients announce
//! their wallet address, push the friend list they read from the ledger, and
//! send chat messages; the relay forwards a message only when sender and
//! receiver list each other as friends.
//!
//! ## Modules
//!
//! - `api` - HTTP and WebSocket handlers (Axum)
//! - `relay` - connection registry, friend mirror and routing
//! - `config` - environment configuration
//! - `state` - shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod state;
