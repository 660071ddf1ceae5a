// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Party-Info Poller
//!
//! Background task that keeps the membership view fresh: after a randomized
//! startup delay (to avoid a thundering herd against bootstrap peers), it
//! broadcasts this node's party-info snapshot to every known peer and
//! merges whatever each peer sends back, then repeats every two minutes.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown. The
//! loop reacts on the next tick boundary; in-flight peer calls are bounded
//! by the client's own timeout.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::PeerClient;
use crate::codec;
use crate::partyinfo::PartyStore;

/// Interval between broadcast sweeps.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Upper bound (exclusive) on the randomized startup delay.
const MAX_INITIAL_DELAY_MS: u64 = 16_000;

/// Background party-info broadcaster.
pub struct PartyInfoPoller {
    party: Arc<PartyStore>,
    client: PeerClient,
    poll_interval: Duration,
}

impl PartyInfoPoller {
    pub fn new(party: Arc<PartyStore>, client: PeerClient) -> Self {
        Self {
            party,
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        let initial_delay =
            Duration::from_millis(rand::thread_rng().gen_range(0..MAX_INITIAL_DELAY_MS));
        info!(
            delay_ms = initial_delay.as_millis() as u64,
            interval_secs = self.poll_interval.as_secs(),
            "Party info poller starting"
        );

        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {},
            _ = shutdown.cancelled() => {
                info!("Party info poller shutting down");
                return;
            }
        }

        loop {
            self.broadcast_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Party info poller shutting down");
                    return;
                }
            }
        }
    }

    /// One broadcast sweep: snapshot under the read lock, release it, then
    /// exchange with every peer that is not ourselves.
    pub(crate) async fn broadcast_step(&self) {
        let encoded = codec::encode_party_info(&self.party.snapshot());
        let peers = self.party.peer_urls();

        for peer_url in peers {
            if peer_url == self.party.own_url() {
                continue;
            }

            match self
                .client
                .exchange_party_info(&peer_url, encoded.clone())
                .await
            {
                Ok(body) => match codec::decode_party_info(&body) {
                    Ok(snapshot) => {
                        debug!(peer = %peer_url, "Party info poller: merged peer response");
                        self.party.merge(&snapshot);
                    }
                    Err(err) => {
                        warn!(peer = %peer_url, error = %err, "Party info poller: undecodable response");
                    }
                },
                Err(err) => {
                    warn!(peer = %peer_url, error = %err, "Party info poller: exchange failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random_public_key;
    use crate::partyinfo::PartySnapshot;
    use axum::routing::post;
    use axum::Router;
    use std::collections::{HashMap, HashSet};

    #[tokio::test]
    async fn broadcast_merges_peer_response() {
        // Peer B responds to /partyinfo with its own snapshot.
        let c_key = random_public_key();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let b_url = format!("http://{}", listener.local_addr().unwrap());

        let b_snapshot = PartySnapshot {
            url: b_url.clone(),
            recipients: [(c_key, "http://c:9003".to_string())].into_iter().collect(),
            parties: ["http://c:9003".to_string()].into_iter().collect(),
        };
        let response = codec::encode_party_info(&b_snapshot);

        tokio::spawn(async move {
            let app = Router::new().route(
                "/partyinfo",
                post(move |body: axum::body::Bytes| {
                    let response = response.clone();
                    async move {
                        // The posted body must itself decode as a snapshot.
                        codec::decode_party_info(&body).unwrap();
                        response
                    }
                }),
            );
            axum::serve(listener, app).await.unwrap();
        });

        let party = Arc::new(PartyStore::new("http://a:9001", vec![b_url.clone()]));
        let poller = PartyInfoPoller::new(party.clone(), PeerClient::new().unwrap());
        poller.broadcast_step().await;

        assert_eq!(
            party.recipient_url(&c_key),
            Some("http://c:9003".to_string())
        );
        let parties = party.snapshot().parties;
        assert!(parties.contains(&b_url));
        assert!(parties.contains("http://c:9003"));
    }

    #[tokio::test]
    async fn unreachable_peer_does_not_poison_the_sweep() {
        let party = Arc::new(PartyStore::new(
            "http://a:9001",
            vec!["http://127.0.0.1:1".to_string()],
        ));
        let poller = PartyInfoPoller::new(party.clone(), PeerClient::new().unwrap());

        // Must complete without panicking; the store is unchanged.
        poller.broadcast_step().await;
        assert_eq!(party.snapshot().recipients, HashMap::new());
        assert_eq!(
            party.snapshot().parties,
            HashSet::from(["http://127.0.0.1:1".to_string()])
        );
    }

    #[tokio::test]
    async fn cancelled_poller_stops_promptly() {
        let party = Arc::new(PartyStore::new("http://a:9001", []));
        let poller = PartyInfoPoller::new(party, PeerClient::new().unwrap());

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poller.run(shutdown.clone()));
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}
