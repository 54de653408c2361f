// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Friend-set mirror.
//!
//! Holds the friend list each identity last reported for itself. The lists
//! are not checked against the ledger; each push replaces the previous one.

use std::collections::{HashMap, HashSet};

use super::error::BlockReason;
use crate::models::Identity;

#[derive(Debug, Default)]
pub struct FriendMirror {
    entries: HashMap<Identity, HashSet<Identity>>,
}

impl FriendMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the friend list of `identity`.
    pub fn update<I>(&mut self, identity: Identity, friends: I)
    where
        I: IntoIterator<Item = Identity>,
    {
        self.entries.insert(identity, friends.into_iter().collect());
    }

    pub fn friends_of(&self, identity: &Identity) -> Option<&HashSet<Identity>> {
        self.entries.get(identity)
    }

    /// Check that `a` and `b` list each other.
    pub fn check_mutual(&self, a: &Identity, b: &Identity) -> Result<(), BlockReason> {
        let (Some(friends_of_a), Some(friends_of_b)) = (self.entries.get(a), self.entries.get(b))
        else {
            return Err(BlockReason::UnknownFriendState);
        };

        if friends_of_a.contains(b) && friends_of_b.contains(a) {
            Ok(())
        } else {
            Err(BlockReason::NotMutualFriends)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
