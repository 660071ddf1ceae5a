// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Dispatch
//!
//! Two HTTP surfaces differing only in which operations they expose:
//!
//! | Operation | Admin (TCP) | Private (IPC socket) |
//! |-----------|-------------|----------------------|
//! | upcheck, version | yes | yes |
//! | push | yes | — |
//! | partyinfo | yes | — |
//! | resend | yes | — |
//! | send, sendraw | — | yes |
//! | receive, receiveraw | — | yes |
//! | delete | — | yes |
//!
//! Admin bodies are the raw binary wire format; private JSON bodies carry
//! binary material as base64. The private surface also serves its OpenAPI
//! document.

use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::error::ApiError;
use crate::keys::NodePublicKey;
use crate::models::{
    DeleteRequest, ReceiveRequest, ReceiveResponse, ResendRequest, SendRequest, SendResponse,
};
use crate::state::AppState;

pub mod admin;
pub mod private;

/// Router for the node-to-node admin listener.
pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .route("/upcheck", get(admin::upcheck))
        .route("/version", get(admin::version))
        .route("/push", post(admin::push))
        .route("/partyinfo", post(admin::partyinfo))
        .route("/resend", post(admin::resend))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Router for the local private API listener.
pub fn private_router(state: AppState) -> Router {
    Router::new()
        .route("/upcheck", get(admin::upcheck))
        .route("/version", get(admin::version))
        .route("/send", post(private::send))
        .route("/sendraw", post(private::send_raw))
        .route("/receive", post(private::receive))
        .route("/receiveraw", post(private::receive_raw))
        .route("/delete", post(private::delete))
        .route("/api-doc/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Decode a base64 field, reporting the field name on failure.
fn decode_b64_field(value: &str, name: &str) -> Result<Vec<u8>, ApiError> {
    B64.decode(value)
        .map_err(|err| ApiError::bad_request(format!("unable to decode {name}: {err}")))
}

/// Decode a base64 field that must be a 32-byte public key.
fn decode_key_field(value: &str, name: &str) -> Result<NodePublicKey, ApiError> {
    let bytes = decode_b64_field(value, name)?;
    NodePublicKey::from_bytes(&bytes)
        .map_err(|err| ApiError::bad_request(format!("unable to decode {name}: {err}")))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        private::send,
        private::receive,
        private::delete,
        admin::upcheck,
        admin::version
    ),
    components(
        schemas(
            SendRequest,
            SendResponse,
            ReceiveRequest,
            ReceiveResponse,
            DeleteRequest,
            ResendRequest
        )
    ),
    tags(
        (name = "Private", description = "Local client payload operations"),
        (name = "Node", description = "Liveness and version")
    )
)]
struct ApiDoc;
