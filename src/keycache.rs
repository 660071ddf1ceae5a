// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Precomputed shared-key cache.
//!
//! Two-level map `(sender pub) → (recipient pub) → shared key`. Reads vastly
//! outnumber writes; writes are insert-only and values are immutable once
//! inserted, so the whole structure sits behind one `RwLock`. The working
//! set is bounded by the number of distinct identity pairs seen, which is
//! small; nothing is ever evicted.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::crypto::{shared_key, SharedKey};
use crate::keys::{NodePublicKey, NodeSecretKey};

#[derive(Default)]
pub struct KeyCache {
    inner: RwLock<HashMap<NodePublicKey, HashMap<NodePublicKey, SharedKey>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the shared key for `(sender, recipient)`, computing and
    /// inserting it on a miss. The Diffie-Hellman precomputation runs
    /// outside the write lock.
    pub fn resolve(
        &self,
        sender_secret: &NodeSecretKey,
        sender: &NodePublicKey,
        recipient: &NodePublicKey,
    ) -> SharedKey {
        {
            let cache = self.inner.read().expect("key cache lock poisoned");
            if let Some(hit) = cache.get(sender).and_then(|per_sender| per_sender.get(recipient)) {
                return hit.clone();
            }
        }

        let computed = shared_key(sender_secret, recipient);

        let mut cache = self.inner.write().expect("key cache lock poisoned");
        cache
            .entry(*sender)
            .or_default()
            .entry(*recipient)
            .or_insert(computed)
            .clone()
    }
}
