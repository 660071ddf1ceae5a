// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Node-to-node (admin) surface handlers: record push, party-info
//! exchange, and resend. Record and party-info bodies are the raw binary
//! wire format; only `resend` speaks JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ApiError;
use crate::models::ResendRequest;
use crate::state::AppState;

use super::{decode_b64_field, decode_key_field};

pub const UPCHECK_RESPONSE: &str = "I'm up!";

const RESEND_ALL: &str = "all";
const RESEND_INDIVIDUAL: &str = "individual";

/// Liveness probe shared by both surfaces.
#[utoipa::path(
    get,
    path = "/upcheck",
    tag = "Node",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn upcheck() -> &'static str {
    UPCHECK_RESPONSE
}

/// Version string shared by both surfaces.
#[utoipa::path(
    get,
    path = "/version",
    tag = "Node",
    responses((status = 200, description = "API version", body = String))
)]
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Accept a record pushed by a peer. The body is the binary encoded record
/// (with an empty recipient list); the response is the raw content digest.
pub async fn push(State(state): State<AppState>, body: Bytes) -> Result<Vec<u8>, ApiError> {
    let digest = state.enclave().accept_push(&body)?;
    Ok(digest)
}

/// Party-info exchange: merge the posted snapshot, respond with our own.
pub async fn partyinfo(State(state): State<AppState>, body: Bytes) -> Result<Vec<u8>, ApiError> {
    let response = state.enclave().update_party_info(&body)?;
    Ok(response)
}

/// Republish previously propagated records.
///
/// `type = "all"` re-pushes every record addressed to the given public key
/// and returns an empty 200; `type = "individual"` returns the binary
/// single-recipient encoded record for the given digest.
pub async fn resend(
    State(state): State<AppState>,
    Json(request): Json<ResendRequest>,
) -> Result<Response, ApiError> {
    let public_key = decode_key_field(&request.public_key, "publicKey")?;

    match request.kind.as_str() {
        RESEND_ALL => {
            state.enclave().retrieve_all_for(&public_key)?;
            Ok(StatusCode::OK.into_response())
        }
        RESEND_INDIVIDUAL => {
            let key = request
                .key
                .as_deref()
                .ok_or_else(|| ApiError::bad_request("individual resend requires a key"))?;
            let digest = decode_b64_field(key, "key")?;
            let encoded = state.enclave().retrieve_for(&digest, &public_key)?;
            Ok(encoded.into_response())
        }
        other => Err(ApiError::bad_request(format!(
            "unrecognized resend type: {other}"
        ))),
    }
}
