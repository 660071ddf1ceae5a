// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the private JSON surface. All binary
//! material (payloads, public keys, digests) crosses this boundary as
//! standard base64 strings; the handlers decode into raw bytes before
//! touching the enclave.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Submit a payload for encryption, storage, and propagation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendRequest {
    /// Base64 transaction payload to store.
    pub payload: String,
    /// Base64 sender public key. Empty or absent selects the node's
    /// default identity.
    #[serde(default)]
    pub from: String,
    /// Base64 public keys of the recipients privy to this payload.
    #[serde(default)]
    pub to: Vec<String>,
}

/// Response to a [`SendRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendResponse {
    /// Base64 content digest under which the payload was stored.
    pub key: String,
}

/// Retrieve a previously stored payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiveRequest {
    /// Base64 content digest.
    pub key: String,
    /// Base64 public key of the local identity to decrypt as. Empty or
    /// absent selects the node's default identity.
    #[serde(default)]
    pub to: String,
}

/// Response to a [`ReceiveRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiveResponse {
    /// Base64 decrypted payload.
    pub payload: String,
}

/// Delete the record stored under a digest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRequest {
    /// Base64 content digest.
    pub key: String,
}

/// Ask this node to republish previously propagated records.
///
/// Two request types are supported:
/// 1. `"all"` — republish everything addressed to `public_key`; `key` is
///    omitted.
/// 2. `"individual"` — return the single-recipient encoded record for the
///    given `key`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResendRequest {
    /// `"all"` or `"individual"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 recipient public key the resend is on behalf of.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Base64 content digest; only for `"individual"` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}
