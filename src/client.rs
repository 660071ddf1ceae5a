// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Peer Client
//!
//! Outbound HTTP to other relay nodes: record push and party-info exchange.
//! One shared `reqwest` client with a wall-clock timeout is built at startup
//! and cloned into every task that talks to peers.
//!
//! Every failure here is transport-layer and therefore non-fatal to the
//! local operation that triggered it; callers log and move on.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use url::Url;

/// Wall-clock timeout applied to every outbound peer call.
const PEER_TIMEOUT: Duration = Duration::from_secs(10);

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid peer URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("peer unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("peer rejected request with status {0}")]
    RejectedByPeer(StatusCode),

    #[error("unreadable peer response: {0}")]
    UnreadableBody(#[source] reqwest::Error),
}

/// HTTP client for node-to-node calls. Cheap to clone.
#[derive(Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(PEER_TIMEOUT).build()?;
        Ok(Self { http })
    }

    /// Push an encoded record to a peer's ingest endpoint. On success the
    /// peer echoes the content digest back.
    pub async fn push(&self, peer_url: &str, encoded: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        self.post_octets(peer_url, "/push", encoded).await
    }

    /// Post our encoded party-info snapshot; the peer responds with its own.
    pub async fn exchange_party_info(
        &self,
        peer_url: &str,
        encoded: Vec<u8>,
    ) -> Result<Vec<u8>, ClientError> {
        self.post_octets(peer_url, "/partyinfo", encoded).await
    }

    async fn post_octets(
        &self,
        peer_url: &str,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, ClientError> {
        let endpoint = build_endpoint(peer_url, path)?;

        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(body)
            .send()
            .await
            .map_err(ClientError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::RejectedByPeer(status));
        }

        let bytes = response.bytes().await.map_err(ClientError::UnreadableBody)?;
        Ok(bytes.to_vec())
    }
}

fn build_endpoint(peer_url: &str, path: &str) -> Result<Url, ClientError> {
    Ok(Url::parse(peer_url)?.join(path)?)
}
