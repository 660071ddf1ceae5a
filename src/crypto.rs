// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cryptographic Primitives
//!
//! Thin wrapper over the curve and AEAD primitives used by the enclave:
//!
//! - **Secret box**: symmetric XChaCha20-Poly1305 under the per-record
//!   master key; encrypts the payload itself.
//! - **Sealed box**: XChaCha20-Poly1305 under a precomputed shared key;
//!   encrypts the master key once per recipient.
//! - **Shared key**: x25519 Diffie-Hellman output run through a
//!   domain-separated SHA3-256 derivation. The result is symmetric in its
//!   arguments: `shared(priv_a, pub_b) == shared(priv_b, pub_a)`, which the
//!   enclave's self-addressing path depends on.
//! - **Digest**: SHA3-512 of the cipher text, the content-derived record key.
//!
//! Callers never learn which authentication check failed; any open failure
//! is the single opaque [`CryptoError::Decryption`].

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_256, Sha3_512};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::keys::{NodePublicKey, NodeSecretKey};

/// Curve point / symmetric key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AEAD nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// SHA3-512 digest size in bytes.
pub const DIGEST_SIZE: usize = 64;

/// A 24-byte nonce, fresh-random per use.
pub type Nonce = [u8; NONCE_SIZE];

/// Domain separation tag for shared-key derivation.
const SHARED_KEY_DOMAIN: &[u8] = b"relay:shared-key:v1";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Authenticated open failed. Deliberately carries no detail about
    /// which envelope or which check was involved.
    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed")]
    Encryption,
}

/// A precomputed 32-byte shared key for one (sender, recipient) pair.
/// Wiped on drop; cloned freely inside the key cache.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; KEY_SIZE]);

impl SharedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedKey(..)")
    }
}

/// Derive the shared key for `(secret, peer)` via x25519 followed by a
/// domain-separated SHA3-256. Symmetric in the underlying keypairs.
pub fn shared_key(secret: &NodeSecretKey, peer: &NodePublicKey) -> SharedKey {
    let scalar = StaticSecret::from(*secret.expose());
    let point = X25519Public::from(*peer.as_bytes());
    let dh = scalar.diffie_hellman(&point);

    let mut kdf = Sha3_256::new();
    kdf.update(SHARED_KEY_DOMAIN);
    kdf.update(dh.as_bytes());
    SharedKey(kdf.finalize().into())
}

/// Symmetric seal of `plain` under a 32-byte key (the payload envelope).
pub fn secretbox_seal(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    plain: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    XChaCha20Poly1305::new(key.into())
        .encrypt(XNonce::from_slice(nonce), plain)
        .map_err(|_| CryptoError::Encryption)
}

/// Symmetric open of `cipher`; fails opaquely on any authentication error.
pub fn secretbox_open(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    cipher: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    XChaCha20Poly1305::new(key.into())
        .decrypt(XNonce::from_slice(nonce), cipher)
        .map_err(|_| CryptoError::Decryption)
}

/// Seal `plain` under a precomputed shared key (the master-key envelope).
pub fn box_seal(shared: &SharedKey, nonce: &Nonce, plain: &[u8]) -> Result<Vec<u8>, CryptoError> {
    secretbox_seal(shared.as_bytes(), nonce, plain)
}

/// Open a sealed box under a precomputed shared key.
pub fn box_open(shared: &SharedKey, nonce: &Nonce, cipher: &[u8]) -> Result<Vec<u8>, CryptoError> {
    secretbox_open(shared.as_bytes(), nonce, cipher)
}

/// SHA3-512 content digest; the sole primary key for stored records.
pub fn payload_digest(bytes: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha3_512::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Fresh random 32-byte symmetric key, wiped when dropped.
pub fn random_key() -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut());
    key
}

/// Fresh random 24-byte nonce.
pub fn random_nonce() -> Nonce {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Fresh random 32 bytes used *as* a public key. This is how the enclave
/// fabricates its ephemeral self-addressing identity: the scalar is never
/// known, only the point is. See the enclave's self-addressing notes.
pub fn random_public_key() -> NodePublicKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    NodePublicKey::from(bytes)
}
