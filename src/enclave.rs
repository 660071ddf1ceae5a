// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Secure Enclave
//!
//! The in-process subsystem holding identity private keys and performing all
//! encryption and decryption. Payloads are double-enveloped: the payload is
//! sealed once under a fresh master key (secret box), and the master key is
//! sealed once per recipient under the pair's precomputed shared key
//! (sealed box). Records are stored under the SHA3-512 of the cipher text
//! and propagated to each recipient as a single-box copy.
//!
//! ## Self-addressing
//!
//! A record with no recipients is stored "to self". The scheme forbids
//! sealing with sender == recipient, so the enclave fabricates one random
//! ephemeral public key at startup and seals the master key under
//! `shared(own_priv, ephemeral_pub)`. Because `shared(a, b) == shared(b, a)`
//! the same private key opens the box again on retrieve. The shared keys for
//! every owned identity against the ephemeral key are precomputed at init.
//!
//! ## Fan-out
//!
//! Pushes to recipients are fire-and-forget on spawned tasks; the peer URL
//! is resolved before spawning so no enclave lock is ever held across
//! network I/O. A peer being unreachable never fails a local store.

use std::sync::Arc;

use tracing::{debug, error, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::client::PeerClient;
use crate::codec::{self, CodecError, EncryptedRecord};
use crate::crypto::{self, CryptoError, KEY_SIZE};
use crate::keycache::KeyCache;
use crate::keys::{NodePublicKey, NodeSecretKey};
use crate::partyinfo::PartyStore;
use crate::storage::{DataStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum EnclaveError {
    #[error("no private key held for sender public key {0}")]
    UnknownSender(NodePublicKey),

    #[error("record not found")]
    NotFound,

    /// Any authenticated-open failure, without detail on which stage failed.
    #[error("decryption failed")]
    Decryption,

    #[error(transparent)]
    Malformed(#[from] CodecError),

    #[error("storage failure: {0}")]
    Storage(StorageError),

    #[error("invalid request: {0}")]
    Input(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for EnclaveError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => EnclaveError::NotFound,
            other => EnclaveError::Storage(other),
        }
    }
}

impl From<CryptoError> for EnclaveError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption => EnclaveError::Decryption,
            CryptoError::Encryption => EnclaveError::Internal("seal failed".to_string()),
        }
    }
}

/// The secure transaction enclave. Owns the record store, the identity
/// keys, the shared-key cache, and a handle to the party-info view used to
/// resolve fan-out targets.
pub struct SecureEnclave {
    store: Box<dyn DataStore>,
    identities: Vec<(NodePublicKey, NodeSecretKey)>,
    /// Ephemeral key for records addressed only to this node.
    self_pub: NodePublicKey,
    key_cache: KeyCache,
    party: Arc<PartyStore>,
    client: PeerClient,
}

impl SecureEnclave {
    /// Create an enclave over the given store and identities. At least one
    /// identity is required; the first one is the default sender/receiver.
    pub fn new(
        store: Box<dyn DataStore>,
        identities: Vec<(NodePublicKey, NodeSecretKey)>,
        party: Arc<PartyStore>,
        client: PeerClient,
    ) -> Result<Self, EnclaveError> {
        if identities.is_empty() {
            return Err(EnclaveError::Input("no identity keys loaded".to_string()));
        }

        let enclave = Self {
            store,
            identities,
            self_pub: crypto::random_public_key(),
            key_cache: KeyCache::new(),
            party,
            client,
        };

        // Warm the cache for the self-addressing path, one entry per owned
        // identity.
        for (public, secret) in &enclave.identities {
            enclave.key_cache.resolve(secret, public, &enclave.self_pub);
        }

        Ok(enclave)
    }

    pub fn public_keys(&self) -> Vec<NodePublicKey> {
        self.identities.iter().map(|(public, _)| *public).collect()
    }

    pub fn default_public_key(&self) -> NodePublicKey {
        self.identities[0].0
    }

    fn secret_for(&self, public: &NodePublicKey) -> Result<&NodeSecretKey, EnclaveError> {
        self.identities
            .iter()
            .find(|(own, _)| own == public)
            .map(|(_, secret)| secret)
            .ok_or(EnclaveError::UnknownSender(*public))
    }

    /// Encrypt `payload`, store the full record locally, and fan single-box
    /// copies out to every recipient. Returns the content digest.
    ///
    /// `sender = None` selects the default identity. An empty recipient
    /// list stores the record to this node only.
    pub fn store(
        &self,
        payload: &[u8],
        sender: Option<NodePublicKey>,
        recipients: &[NodePublicKey],
    ) -> Result<Vec<u8>, EnclaveError> {
        let sender_pub = sender.unwrap_or_else(|| self.default_public_key());
        let sender_secret = self.secret_for(&sender_pub)?;

        let payload_nonce = crypto::random_nonce();
        let recipient_nonce = crypto::random_nonce();
        let master = crypto::random_key();

        let cipher_text = crypto::secretbox_seal(&master, &payload_nonce, payload)?;

        let mut effective = Vec::with_capacity(recipients.len().max(1));
        let mut boxes = Vec::with_capacity(recipients.len().max(1));
        for recipient in recipients {
            if *recipient == sender_pub {
                warn!(recipient = %recipient, "Store: sender cannot be a recipient, skipping");
                continue;
            }
            let shared = self.key_cache.resolve(sender_secret, &sender_pub, recipient);
            boxes.push(crypto::box_seal(&shared, &recipient_nonce, master.as_ref())?);
            effective.push(*recipient);
        }

        let to_self = recipients.is_empty();
        if to_self {
            // Store-to-self: one box sealed against the ephemeral key.
            let shared = self
                .key_cache
                .resolve(sender_secret, &sender_pub, &self.self_pub);
            boxes.push(crypto::box_seal(&shared, &recipient_nonce, master.as_ref())?);
            effective.push(self.self_pub);
        } else if effective.is_empty() {
            return Err(EnclaveError::Input(
                "no recipients remain after filtering".to_string(),
            ));
        }

        let record = EncryptedRecord {
            sender: sender_pub,
            cipher_text,
            payload_nonce,
            recipient_boxes: boxes,
            recipient_nonce,
        };

        let digest = crypto::payload_digest(&record.cipher_text).to_vec();
        let encoded = codec::encode_record_with_recipients(&record, &effective);
        self.store.put(&digest, &encoded)?;

        if !to_self {
            for (index, recipient) in effective.iter().enumerate() {
                self.publish(single_box_record(&record, index), recipient, &digest);
            }
        }

        Ok(digest)
    }

    /// Resolve the recipient's URL and dispatch a push on its own task.
    /// Failures are logged and dropped; delivery is best-effort.
    fn publish(&self, record: EncryptedRecord, recipient: &NodePublicKey, digest: &[u8]) {
        let Some(url) = self.party.recipient_url(recipient) else {
            error!(recipient = %recipient, "Unable to resolve peer URL for recipient");
            return;
        };

        debug!(
            recipient = %recipient,
            digest = %hex::encode(digest),
            peer = %url,
            "Publishing record"
        );

        let encoded = codec::encode_record_with_recipients(&record, &[]);
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(err) = client.push(&url, encoded).await {
                warn!(peer = %url, error = %err, "Record push failed");
            }
        });
    }

    /// Store a record that was propagated to this node by a peer. The
    /// encoded bytes are stored verbatim after validation; the digest is
    /// echoed back to the pusher.
    pub fn accept_push(&self, encoded: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let (record, _) = codec::decode_record_with_recipients(encoded)?;
        let digest = crypto::payload_digest(&record.cipher_text).to_vec();
        self.store.put(&digest, encoded)?;
        Ok(digest)
    }

    /// Decrypt the payload stored under `digest`.
    ///
    /// `to` names the local identity to decrypt as; it defaults to the
    /// first loaded identity. For records this node originated the stored
    /// first recipient determines the shared key instead.
    pub fn retrieve(
        &self,
        digest: &[u8],
        to: Option<&NodePublicKey>,
    ) -> Result<Vec<u8>, EnclaveError> {
        let encoded = self.store.get(digest)?;
        let (record, recipients) = self.decode_stored(digest, &encoded)?;

        let (sender_pub, recipient_pub) = if recipients.is_empty() {
            // Pushed to us: we are the recipient, the wire sender is the
            // counterparty.
            let own = to.copied().unwrap_or_else(|| self.default_public_key());
            (own, record.sender)
        } else {
            // Originated here.
            (record.sender, recipients[0])
        };

        let sender_secret = self.secret_for(&sender_pub)?;
        // The cache may be cold for this pair after a restart.
        let shared = self
            .key_cache
            .resolve(sender_secret, &sender_pub, &recipient_pub);

        let mut master_bytes =
            crypto::box_open(&shared, &record.recipient_nonce, &record.recipient_boxes[0])?;
        if master_bytes.len() != KEY_SIZE {
            master_bytes.zeroize();
            return Err(EnclaveError::Decryption);
        }
        let mut master = Zeroizing::new([0u8; KEY_SIZE]);
        master.copy_from_slice(&master_bytes);
        master_bytes.zeroize();

        let payload = crypto::secretbox_open(&master, &record.payload_nonce, &record.cipher_text)?;
        Ok(payload)
    }

    /// Re-encode the single-recipient copy of a stored record for
    /// `recipient`, byte-equal in shape to what fan-out originally pushed.
    pub fn retrieve_for(
        &self,
        digest: &[u8],
        recipient: &NodePublicKey,
    ) -> Result<Vec<u8>, EnclaveError> {
        let encoded = self.store.get(digest)?;
        let (record, recipients) = self.decode_stored(digest, &encoded)?;

        let index = recipients
            .iter()
            .position(|candidate| candidate == recipient)
            .filter(|index| *index < record.recipient_boxes.len())
            .ok_or(EnclaveError::NotFound)?;

        Ok(codec::encode_record(&single_box_record(&record, index)))
    }

    /// Re-push the single-recipient copy of every stored record addressed
    /// to `recipient`. Used by peers rejoining the network. Undecodable
    /// records are logged and skipped; push outcomes are logged only.
    pub fn retrieve_all_for(&self, recipient: &NodePublicKey) -> Result<(), EnclaveError> {
        let mut outgoing = Vec::new();

        self.store.scan(&mut |key, value| {
            match codec::decode_record_with_recipients(value) {
                Ok((record, recipients)) => {
                    let matched = recipients
                        .iter()
                        .position(|candidate| candidate == recipient)
                        .filter(|index| *index < record.recipient_boxes.len());
                    if let Some(index) = matched {
                        outgoing.push((single_box_record(&record, index), key.to_vec()));
                    }
                }
                Err(err) => {
                    // One bad record must not abort the resend sweep.
                    warn!(
                        digest = %hex::encode(key),
                        error = %err,
                        "Skipping undecodable stored record during resend"
                    );
                }
            }
            Ok(())
        })?;

        for (record, digest) in outgoing {
            self.publish(record, recipient, &digest);
        }
        Ok(())
    }

    /// Remove the record stored under `digest`.
    pub fn delete(&self, digest: &[u8]) -> Result<(), EnclaveError> {
        self.store.delete(digest)?;
        Ok(())
    }

    /// Merge an encoded party-info snapshot from a peer and return our own
    /// encoded view, making one exchange bidirectional.
    pub fn update_party_info(&self, encoded: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let snapshot = codec::decode_party_info(encoded)?;
        self.party.merge(&snapshot);
        Ok(self.encoded_party_info())
    }

    pub fn encoded_party_info(&self) -> Vec<u8> {
        codec::encode_party_info(&self.party.snapshot())
    }

    /// Release the record store.
    pub fn close(&self) {
        if let Err(err) = self.store.close() {
            error!(error = %err, "Failed to close record store");
        }
    }

    /// A malformed stored record reads as absent; the corruption is logged.
    fn decode_stored(
        &self,
        digest: &[u8],
        encoded: &[u8],
    ) -> Result<(EncryptedRecord, Vec<NodePublicKey>), EnclaveError> {
        codec::decode_record_with_recipients(encoded).map_err(|err| {
            error!(
                digest = %hex::encode(digest),
                error = %err,
                "Stored record is undecodable"
            );
            EnclaveError::NotFound
        })
    }
}

fn single_box_record(record: &EncryptedRecord, index: usize) -> EncryptedRecord {
    EncryptedRecord {
        sender: record.sender,
        cipher_text: record.cipher_text.clone(),
        payload_nonce: record.payload_nonce,
        recipient_boxes: vec![record.recipient_boxes[index].clone()],
        recipient_nonce: record.recipient_nonce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordDb;
    use axum::routing::post;
    use axum::Router;
    use rand::rngs::OsRng;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

    fn keypair() -> (NodePublicKey, NodeSecretKey) {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519Public::from(&secret);
        (
            NodePublicKey::from(*public.as_bytes()),
            NodeSecretKey::from_bytes(secret.as_bytes()).unwrap(),
        )
    }

    fn test_store() -> (Box<dyn DataStore>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("test-enclave-{}", uuid::Uuid::new_v4()));
        let db = RecordDb::open(&dir.join("records.redb")).expect("Failed to open test db");
        (Box::new(db), dir)
    }

    fn test_enclave(
        own_url: &str,
        identities: Vec<(NodePublicKey, NodeSecretKey)>,
    ) -> (SecureEnclave, Arc<PartyStore>, PathBuf) {
        let (store, dir) = test_store();
        let party = Arc::new(PartyStore::new(own_url, []));
        let enclave = SecureEnclave::new(store, identities, party.clone(), PeerClient::new().unwrap())
            .unwrap();
        (enclave, party, dir)
    }

    /// Listener that records every body POSTed to /push.
    async fn push_capture_server() -> (String, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let app = Router::new().route(
            "/push",
            post(move |body: axum::body::Bytes| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body.to_vec());
                    "ok"
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (url, rx)
    }

    async fn next_push(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<u8> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no push arrived")
            .expect("push channel closed")
    }

    #[tokio::test]
    async fn self_store_roundtrip() {
        let identity = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![identity]);

        let digest = enclave.store(b"Test message", None, &[]).unwrap();

        // The digest is the SHA3-512 of the stored cipher text.
        let stored = enclave.store.get(&digest).unwrap();
        let (record, _) = codec::decode_record_with_recipients(&stored).unwrap();
        assert_eq!(digest, crypto::payload_digest(&record.cipher_text).to_vec());

        assert_eq!(enclave.retrieve(&digest, None).unwrap(), b"Test message");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn two_party_store_pushes_one_single_box_copy() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, _) = keypair();
        let (enclave, party, dir) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);

        let (b_url, mut pushes) = push_capture_server().await;
        party.merge(&crate::partyinfo::PartySnapshot {
            url: b_url.clone(),
            recipients: [(b_pub, b_url.clone())].into_iter().collect(),
            parties: Default::default(),
        });

        let digest = enclave.store(b"payload", Some(a_pub), &[b_pub]).unwrap();

        let pushed = next_push(&mut pushes).await;
        let (pushed_record, pushed_recipients) =
            codec::decode_record_with_recipients(&pushed).unwrap();
        assert!(pushed_recipients.is_empty());
        assert_eq!(pushed_record.recipient_boxes.len(), 1);
        assert_eq!(pushed_record.sender, a_pub);

        // Exactly one push.
        assert!(pushes.try_recv().is_err());

        assert_eq!(enclave.retrieve(&digest, None).unwrap(), b"payload");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn pushed_record_decrypts_on_the_recipient_node() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, b_priv) = keypair();

        let (enclave_a, party_a, dir_a) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);
        let (enclave_b, _, dir_b) = test_enclave("http://b:9002", vec![(b_pub, b_priv)]);

        let (b_url, mut pushes) = push_capture_server().await;
        party_a.merge(&crate::partyinfo::PartySnapshot {
            url: b_url.clone(),
            recipients: [(b_pub, b_url)].into_iter().collect(),
            parties: Default::default(),
        });

        enclave_a.store(b"payload", Some(a_pub), &[b_pub]).unwrap();
        let pushed = next_push(&mut pushes).await;

        let digest = enclave_b.accept_push(&pushed).unwrap();
        assert_eq!(
            enclave_b.retrieve(&digest, Some(&b_pub)).unwrap(),
            b"payload"
        );
        // The default identity resolves the same way.
        assert_eq!(enclave_b.retrieve(&digest, None).unwrap(), b"payload");

        let _ = std::fs::remove_dir_all(&dir_a);
        let _ = std::fs::remove_dir_all(&dir_b);
    }

    #[tokio::test]
    async fn unknown_sender_is_rejected() {
        let identity = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![identity]);
        let (stranger, _) = keypair();
        let (recipient, _) = keypair();

        assert!(matches!(
            enclave.store(b"x", Some(stranger), &[recipient]),
            Err(EnclaveError::UnknownSender(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn resend_all_republishes_every_matching_record() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, _) = keypair();
        let (c_pub, _) = keypair();
        let (enclave, party, dir) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);

        let (b_url, mut pushes) = push_capture_server().await;
        party.merge(&crate::partyinfo::PartySnapshot {
            url: b_url.clone(),
            recipients: [(b_pub, b_url.clone()), (c_pub, b_url)].into_iter().collect(),
            parties: Default::default(),
        });

        enclave.store(b"first", Some(a_pub), &[b_pub]).unwrap();
        enclave.store(b"second", Some(a_pub), &[b_pub]).unwrap();
        enclave.store(b"other", Some(a_pub), &[c_pub]).unwrap();

        // Drain the three fan-out pushes.
        for _ in 0..3 {
            next_push(&mut pushes).await;
        }

        enclave.retrieve_all_for(&b_pub).unwrap();

        let replay_one = next_push(&mut pushes).await;
        let replay_two = next_push(&mut pushes).await;
        assert!(pushes.try_recv().is_err(), "only B's records are resent");

        for replayed in [replay_one, replay_two] {
            let (record, recipients) = codec::decode_record_with_recipients(&replayed).unwrap();
            assert!(recipients.is_empty());
            assert_eq!(record.recipient_boxes.len(), 1);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn retrieve_for_selects_the_matching_box() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, _) = keypair();
        let (c_pub, c_priv) = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);

        let digest = enclave
            .store(b"shared payload", Some(a_pub), &[b_pub, c_pub])
            .unwrap();

        let encoded = enclave.retrieve_for(&digest, &c_pub).unwrap();
        let record = codec::decode_record(&encoded).unwrap();
        assert_eq!(record.recipient_boxes.len(), 1);

        // C can open its box with shared(c_priv, a_pub) and then the payload.
        let shared = crypto::shared_key(&c_priv, &a_pub);
        let master = crypto::box_open(&shared, &record.recipient_nonce, &record.recipient_boxes[0])
            .unwrap();
        let master: [u8; KEY_SIZE] = master.try_into().unwrap();
        let payload =
            crypto::secretbox_open(&master, &record.payload_nonce, &record.cipher_text).unwrap();
        assert_eq!(payload, b"shared payload");

        // A recipient that was never addressed gets NotFound.
        let (stranger, _) = keypair();
        assert!(matches!(
            enclave.retrieve_for(&digest, &stranger),
            Err(EnclaveError::NotFound)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let identity = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![identity]);

        let digest = enclave.store(b"gone soon", None, &[]).unwrap();
        enclave.delete(&digest).unwrap();

        assert!(matches!(
            enclave.retrieve(&digest, None),
            Err(EnclaveError::NotFound)
        ));
        assert!(matches!(enclave.delete(&digest), Err(EnclaveError::NotFound)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn self_recipients_are_filtered() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, _) = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);

        // Self among others: dropped, the rest keeps its box alignment.
        let digest = enclave
            .store(b"payload", Some(a_pub), &[a_pub, b_pub])
            .unwrap();
        let stored = enclave.store.get(&digest).unwrap();
        let (record, recipients) = codec::decode_record_with_recipients(&stored).unwrap();
        assert_eq!(recipients, vec![b_pub]);
        assert_eq!(record.recipient_boxes.len(), 1);

        // Self as the only recipient: nothing left to seal to.
        assert!(matches!(
            enclave.store(b"payload", Some(a_pub), &[a_pub]),
            Err(EnclaveError::Input(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn mismatched_to_is_permitted_for_originated_records() {
        let (a_pub, a_priv) = keypair();
        let (b_pub, _) = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![(a_pub, a_priv)]);

        let digest = enclave.store(b"payload", Some(a_pub), &[b_pub]).unwrap();

        // The stored recipient list, not the caller's `to`, drives the
        // originator decrypt path.
        let (unrelated, _) = keypair();
        assert_eq!(
            enclave.retrieve(&digest, Some(&unrelated)).unwrap(),
            b"payload"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn malformed_push_is_rejected() {
        let identity = keypair();
        let (enclave, _, dir) = test_enclave("http://a:9001", vec![identity]);

        assert!(matches!(
            enclave.accept_push(b"not a record"),
            Err(EnclaveError::Malformed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn party_info_exchange_merges_and_echoes() {
        let identity = keypair();
        let own_pub = identity.0;
        let (enclave, party, dir) = test_enclave("http://a:9001", vec![identity]);
        party.register(&[own_pub]);

        let (peer_key, _) = keypair();
        let peer_snapshot = crate::partyinfo::PartySnapshot {
            url: "http://b:9002".to_string(),
            recipients: [(peer_key, "http://b:9002".to_string())].into_iter().collect(),
            parties: ["http://b:9002".to_string()].into_iter().collect(),
        };

        let response = enclave
            .update_party_info(&codec::encode_party_info(&peer_snapshot))
            .unwrap();

        // The response is our own merged view.
        let echoed = codec::decode_party_info(&response).unwrap();
        assert_eq!(echoed.url, "http://a:9001");
        assert_eq!(
            echoed.recipients.get(&peer_key),
            Some(&"http://b:9002".to_string())
        );
        assert_eq!(
            echoed.recipients.get(&own_pub),
            Some(&"http://a:9001".to_string())
        );
        assert!(echoed.parties.contains("http://b:9002"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
