// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Key Material
//!
//! Every node owns one or more long-lived curve25519 identities. This module
//! defines the key newtypes used throughout the enclave and the on-disk
//! formats they are loaded from:
//!
//! - **Public key file**: a single base64 line of the 32-byte curve point,
//!   e.g. `BULeR8JyUWhiuuCMU/HLA0Q5pzkYT+cHII3ZKBey3Bo=`
//! - **Private key file**: a small JSON document,
//!   `{"type":"unlocked","data":{"bytes":"<base64 scalar>"}}`. `"unlocked"`
//!   is the only recognized type.
//!
//! Private scalars are zeroized on drop and never serialized back out except
//! by the explicit key-generation path.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KEY_SIZE;

/// Errors produced while parsing, loading, or generating identity keys.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("incorrect key length: {0}")]
    InvalidLength(usize),

    #[error("invalid base64 key material: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unsupported private key type: {0:?}")]
    UnsupportedKeyType(String),

    #[error("key file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid private key document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A 32-byte curve25519 public key. Doubles as a node identity and as a map
/// key in the resolver and shared-key cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePublicKey([u8; KEY_SIZE]);

impl NodePublicKey {
    /// Wrap raw bytes, enforcing the 32-byte length.
    pub fn from_bytes(src: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; KEY_SIZE] = src
            .try_into()
            .map_err(|_| KeyError::InvalidLength(src.len()))?;
        Ok(NodePublicKey(bytes))
    }

    /// Parse a standard-base64 encoded key.
    pub fn from_b64(encoded: &str) -> Result<Self, KeyError> {
        let decoded = B64.decode(encoded.trim())?;
        Self::from_bytes(&decoded)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_b64(&self) -> String {
        B64.encode(self.0)
    }
}

impl From<[u8; KEY_SIZE]> for NodePublicKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        NodePublicKey(bytes)
    }
}

impl fmt::Display for NodePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b64())
    }
}

impl fmt::Debug for NodePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePublicKey({})", self.to_b64())
    }
}

/// A 32-byte curve25519 secret scalar. Lives for the process lifetime and
/// never leaves the enclave; the backing bytes are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NodeSecretKey([u8; KEY_SIZE]);

impl NodeSecretKey {
    pub fn from_bytes(src: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; KEY_SIZE] = src
            .try_into()
            .map_err(|_| KeyError::InvalidLength(src.len()))?;
        Ok(NodeSecretKey(bytes))
    }

    pub fn from_b64(encoded: &str) -> Result<Self, KeyError> {
        let decoded = B64.decode(encoded.trim())?;
        Self::from_bytes(&decoded)
    }

    /// Raw scalar access for Diffie-Hellman precomputation.
    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for NodeSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the scalar.
        write!(f, "NodeSecretKey(..)")
    }
}

/// Base64 payload of a private key document.
#[derive(Debug, Serialize, Deserialize)]
struct PrivateKeyBytes {
    bytes: String,
}

/// On-disk private key document.
#[derive(Debug, Serialize, Deserialize)]
struct PrivateKeyDocument {
    data: PrivateKeyBytes,
    #[serde(rename = "type")]
    kind: String,
}

const UNLOCKED_KEY_TYPE: &str = "unlocked";

/// Load a public key file: one base64 line.
pub fn load_public_key(path: &Path) -> Result<NodePublicKey, KeyError> {
    let contents = fs::read_to_string(path)?;
    NodePublicKey::from_b64(&contents)
}

/// Load a private key file: JSON document with an `"unlocked"` type tag.
pub fn load_private_key(path: &Path) -> Result<NodeSecretKey, KeyError> {
    let contents = fs::read_to_string(path)?;
    let document: PrivateKeyDocument = serde_json::from_str(&contents)?;
    if document.kind != UNLOCKED_KEY_TYPE {
        return Err(KeyError::UnsupportedKeyType(document.kind));
    }
    NodeSecretKey::from_b64(&document.data.bytes)
}

/// Load paired identity key files. The two lists must be the same length;
/// `keypairs[i]` pairs `public_paths[i]` with `private_paths[i]`.
pub fn load_keypairs(
    public_paths: &[PathBuf],
    private_paths: &[PathBuf],
) -> Result<Vec<(NodePublicKey, NodeSecretKey)>, KeyError> {
    let mut pairs = Vec::with_capacity(public_paths.len());
    for (public_path, private_path) in public_paths.iter().zip(private_paths) {
        let public = load_public_key(public_path)?;
        let secret = load_private_key(private_path)?;
        pairs.push((public, secret));
    }
    Ok(pairs)
}

/// Generate a fresh identity and write `<base>.pub` / `<base>.key`.
///
/// Returns the two paths written. Files are created with mode 0600.
pub fn generate_keypair_files(base: &Path) -> Result<(PathBuf, PathBuf), KeyError> {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = X25519Public::from(&secret);

    if let Some(parent) = base.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let public_path = base.with_extension("pub");
    let private_path = base.with_extension("key");

    fs::write(&public_path, B64.encode(public.as_bytes()))?;

    let document = PrivateKeyDocument {
        data: PrivateKeyBytes {
            bytes: B64.encode(secret.as_bytes()),
        },
        kind: UNLOCKED_KEY_TYPE.to_string(),
    };
    fs::write(&private_path, serde_json::to_vec(&document)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for path in [&public_path, &private_path] {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
    }

    Ok((public_path, private_path))
}
