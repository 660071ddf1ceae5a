// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local-client (private) surface handlers. JSON endpoints carry all
//! binary material as base64; the `raw` variants take binary bodies with
//! the sender/recipient/key passed in `c11n-*` headers, matching what
//! Quorum-style clients send.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

use crate::error::ApiError;
use crate::keys::NodePublicKey;
use crate::models::{
    DeleteRequest, ReceiveRequest, ReceiveResponse, SendRequest, SendResponse,
};
use crate::state::AppState;

use super::{decode_b64_field, decode_key_field};

/// Sender public key header for the raw variants.
pub const HEADER_FROM: &str = "c11n-from";
/// Recipient public key header (repeatable) for the raw variants.
pub const HEADER_TO: &str = "c11n-to";
/// Digest header for `receiveraw`.
pub const HEADER_KEY: &str = "c11n-key";

/// Store a payload for the given recipients.
#[utoipa::path(
    post,
    path = "/send",
    tag = "Private",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Payload stored and propagated", body = SendResponse),
        (status = 400, description = "Malformed request or unknown sender")
    )
)]
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let payload = decode_b64_field(&request.payload, "payload")?;
    let sender = optional_key(&request.from, "from")?;

    let mut recipients = Vec::with_capacity(request.to.len());
    for encoded in &request.to {
        recipients.push(decode_key_field(encoded, "recipient")?);
    }

    let digest = state.enclave().store(&payload, sender, &recipients)?;
    Ok(Json(SendResponse {
        key: B64.encode(digest),
    }))
}

/// Raw variant of [`send`]: binary body, identities in headers.
pub async fn send_raw(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, ApiError> {
    let sender = match header_value(&headers, HEADER_FROM)? {
        Some(value) if !value.is_empty() => Some(decode_key_field(&value, HEADER_FROM)?),
        _ => None,
    };

    let mut recipients = Vec::new();
    for value in headers.get_all(HEADER_TO) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::bad_request("c11n-to header is not valid text"))?;
        recipients.push(decode_key_field(value, HEADER_TO)?);
    }

    let digest = state.enclave().store(&body, sender, &recipients)?;
    Ok(B64.encode(digest))
}

/// Retrieve and decrypt a stored payload.
#[utoipa::path(
    post,
    path = "/receive",
    tag = "Private",
    request_body = ReceiveRequest,
    responses(
        (status = 200, description = "Decrypted payload", body = ReceiveResponse),
        (status = 400, description = "Malformed request or decryption failure"),
        (status = 404, description = "No record under the given key")
    )
)]
pub async fn receive(
    State(state): State<AppState>,
    Json(request): Json<ReceiveRequest>,
) -> Result<Json<ReceiveResponse>, ApiError> {
    let digest = decode_b64_field(&request.key, "key")?;
    let to = optional_key(&request.to, "to")?;

    let payload = state.enclave().retrieve(&digest, to.as_ref())?;
    Ok(Json(ReceiveResponse {
        payload: B64.encode(payload),
    }))
}

/// Raw variant of [`receive`]: digest and identity in headers, payload
/// bytes straight back in the body.
pub async fn receive_raw(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Vec<u8>, ApiError> {
    let key = header_value(&headers, HEADER_KEY)?
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("key not specified"))?;
    let digest = decode_b64_field(&key, HEADER_KEY)?;

    let to = match header_value(&headers, HEADER_TO)? {
        Some(value) if !value.is_empty() => Some(decode_key_field(&value, HEADER_TO)?),
        _ => None,
    };

    let payload = state.enclave().retrieve(&digest, to.as_ref())?;
    Ok(payload)
}

/// Delete the record stored under a digest.
#[utoipa::path(
    post,
    path = "/delete",
    tag = "Private",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Record deleted"),
        (status = 404, description = "No record under the given key")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<StatusCode, ApiError> {
    let digest = decode_b64_field(&request.key, "key")?;
    state.enclave().delete(&digest)?;
    Ok(StatusCode::OK)
}

fn optional_key(encoded: &str, field: &str) -> Result<Option<NodePublicKey>, ApiError> {
    if encoded.is_empty() {
        Ok(None)
    } else {
        Ok(Some(decode_key_field(encoded, field)?))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<Option<String>, ApiError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::to_owned)
                .map_err(|_| ApiError::bad_request(format!("{name} header is not valid text")))
        })
        .transpose()
}
