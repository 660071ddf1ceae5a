// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Party-Info Store
//!
//! Eventually-consistent view of the network: the set of known peer URLs
//! plus a resolver mapping recipient public keys to the URL of the node
//! hosting them. Mutated only by gossip merges and local key registration;
//! merges are idempotent, commutative, and monotone (gossip never removes
//! entries).
//!
//! Gossip payloads are unsigned, so a peer can reassign `key → url`
//! mappings. That is a known protocol weakness inherited from the wire
//! format; [`PartyStore::merge`] is the single place a future signature
//! check slots in.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::keys::NodePublicKey;

/// A point-in-time copy of the party-info state, used for gossip encoding
/// and merging. Map/set semantics; iteration order is not meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySnapshot {
    /// Advertised URL of the node the snapshot describes.
    pub url: String,
    /// Recipient public key → hosting node URL.
    pub recipients: HashMap<NodePublicKey, String>,
    /// Known peer URLs.
    pub parties: HashSet<String>,
}

struct Inner {
    recipients: HashMap<NodePublicKey, String>,
    parties: HashSet<String>,
}

/// Shared mutable party-info state. Readers (fan-out URL resolution,
/// broadcast snapshots) take the read lock; merges take the write lock.
/// Snapshots are taken under the lock and released before any network I/O.
pub struct PartyStore {
    own_url: String,
    inner: RwLock<Inner>,
}

impl PartyStore {
    /// Create a store advertising `own_url`, seeded with boot peer URLs.
    pub fn new(own_url: impl Into<String>, boot_peers: impl IntoIterator<Item = String>) -> Self {
        Self {
            own_url: own_url.into(),
            inner: RwLock::new(Inner {
                recipients: HashMap::new(),
                parties: boot_peers.into_iter().filter(|url| !url.is_empty()).collect(),
            }),
        }
    }

    pub fn own_url(&self) -> &str {
        &self.own_url
    }

    /// Associate this node's own public keys with its advertised URL.
    pub fn register(&self, keys: &[NodePublicKey]) {
        let mut inner = self.inner.write().expect("party store lock poisoned");
        for key in keys {
            inner.recipients.insert(*key, self.own_url.clone());
        }
    }

    /// Resolve the URL hosting `key`, if known.
    pub fn recipient_url(&self, key: &NodePublicKey) -> Option<String> {
        let inner = self.inner.read().expect("party store lock poisoned");
        inner.recipients.get(key).cloned()
    }

    /// Copy of the known peer URLs, for iteration outside the lock.
    pub fn peer_urls(&self) -> Vec<String> {
        let inner = self.inner.read().expect("party store lock poisoned");
        inner.parties.iter().cloned().collect()
    }

    /// Point-in-time snapshot for transmission to peers.
    pub fn snapshot(&self) -> PartySnapshot {
        let inner = self.inner.read().expect("party store lock poisoned");
        PartySnapshot {
            url: self.own_url.clone(),
            recipients: inner.recipients.clone(),
            parties: inner.parties.clone(),
        }
    }

    /// Merge a peer's snapshot into this store.
    ///
    /// Resolver entries claiming our own URL are ignored: only we may say
    /// which keys we host. Peer URLs are upserted as-is; our own URL
    /// appearing among them is tolerated.
    pub fn merge(&self, other: &PartySnapshot) {
        let mut inner = self.inner.write().expect("party store lock poisoned");

        for (key, url) in &other.recipients {
            if *url != self.own_url {
                inner.recipients.insert(*key, url.clone());
            }
        }

        for url in &other.parties {
            if inner.parties.insert(url.clone()) {
                tracing::debug!(peer = %url, "party info: learned new peer");
            }
        }
    }
}
