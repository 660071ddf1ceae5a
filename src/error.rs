// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Error Handling
//!
//! This module provides a unified error type for both HTTP surfaces.
//! Errors are automatically converted to JSON responses with appropriate
//! HTTP status codes.
//!
//! ## JSON Response Format
//!
//! All errors are returned as JSON with a single `error` field:
//!
//! ```json
//! { "error": "record not found" }
//! ```
//!
//! ## Enclave error mapping
//!
//! | Enclave error | Status |
//! |---------------|--------|
//! | `UnknownSender`, `Decryption`, `Malformed`, `Input` | 400 |
//! | `NotFound` | 404 |
//! | `Storage`, `Internal` | 500 (logged, detail withheld) |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::enclave::EnclaveError;

/// API error with HTTP status and message.
///
/// This type implements `IntoResponse`, allowing it to be returned directly
/// from Axum handlers. The error is serialized as JSON.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code for the response.
    pub status: StatusCode,
    /// Human-readable error message (included in JSON response).
    pub message: String,
}

/// JSON body structure for error responses.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Create a new API error with the given status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 500 Internal Server Error. Avoid exposing internal details.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<EnclaveError> for ApiError {
    fn from(err: EnclaveError) -> Self {
        match &err {
            EnclaveError::NotFound => ApiError::not_found(err.to_string()),
            EnclaveError::UnknownSender(_)
            | EnclaveError::Decryption
            | EnclaveError::Malformed(_)
            | EnclaveError::Input(_) => ApiError::bad_request(err.to_string()),
            EnclaveError::Storage(_) | EnclaveError::Internal(_) => {
                tracing::error!(error = %err, "Request failed on a server-side error");
                ApiError::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
