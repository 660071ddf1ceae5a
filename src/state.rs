// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Application State
//!
//! Shared state passed to every Axum request handler via the `State`
//! extractor. The enclave uniquely owns the record store, the shared-key
//! cache, and (through an `Arc`) the party-info view, so handlers only ever
//! need the one reference-counted handle.
//!
//! `AppState` is `Clone` and `Send + Sync`; the admin listener, the private
//! listener, and every spawned fan-out task share the same enclave.

use std::sync::Arc;

use crate::enclave::SecureEnclave;

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reference-counted enclave instance.
    pub enclave: Arc<SecureEnclave>,
}

impl AppState {
    /// Create new application state around an initialized enclave.
    pub fn new(enclave: SecureEnclave) -> Self {
        Self {
            enclave: Arc::new(enclave),
        }
    }

    /// Get a reference to the enclave.
    pub fn enclave(&self) -> &Arc<SecureEnclave> {
        &self.enclave
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PeerClient;
    use crate::partyinfo::PartyStore;
    use crate::storage::RecordDb;
    use rand::rngs::OsRng;
    use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

    fn test_state() -> AppState {
        let dir = std::env::temp_dir().join(format!("test-state-{}", uuid::Uuid::new_v4()));
        let db = RecordDb::open(&dir.join("records.redb")).expect("Failed to open test db");

        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519Public::from(&secret);
        let identities = vec![(
            crate::keys::NodePublicKey::from(*public.as_bytes()),
            crate::keys::NodeSecretKey::from_bytes(secret.as_bytes()).unwrap(),
        )];

        let party = Arc::new(PartyStore::new("http://localhost:9001", []));
        let enclave = SecureEnclave::new(
            Box::new(db),
            identities,
            party,
            PeerClient::new().unwrap(),
        )
        .unwrap();
        AppState::new(enclave)
    }

    #[test]
    fn state_can_be_cloned() {
        let state = test_state();
        let cloned = state.clone();
        assert_eq!(
            state.enclave().default_public_key(),
            cloned.enclave().default_public_key()
        );
    }
}
