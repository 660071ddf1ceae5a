// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relational_relay::api::{admin_router, private_router};
use relational_relay::client::PeerClient;
use relational_relay::config::{Config, RunMode};
use relational_relay::enclave::SecureEnclave;
use relational_relay::gossip::PartyInfoPoller;
use relational_relay::keys;
use relational_relay::partyinfo::PartyStore;
use relational_relay::state::AppState;
use relational_relay::storage::open_data_store;

#[tokio::main]
async fn main() -> ExitCode {
    let mode = match Config::from_env() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match mode {
        RunMode::GenerateKeys(base) => {
            init_logging("info");
            match keys::generate_keypair_files(&base) {
                Ok((public_path, private_path)) => {
                    info!(
                        public = %public_path.display(),
                        private = %private_path.display(),
                        "Key pair successfully written"
                    );
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!(error = %err, "Key generation failed");
                    ExitCode::FAILURE
                }
            }
        }
        RunMode::Serve(config) => serve(*config).await,
    }
}

fn init_logging(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: Config) -> ExitCode {
    init_logging(config.log_filter());

    // TLS termination happens in front of the node; the material is only
    // validated here so misconfiguration fails at startup, not first use.
    if let Some(tls) = &config.tls {
        for path in [Some(&tls.server_cert), Some(&tls.server_key), tls.server_trust.as_ref()]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                error!(path = %path.display(), "TLS material not found");
                return ExitCode::FAILURE;
            }
        }
    }

    let store = match open_data_store(&config.storage_path, config.dir_storage) {
        Ok(store) => store,
        Err(err) => {
            error!(
                path = %config.storage_path.display(),
                error = %err,
                "Unable to initialise storage"
            );
            return ExitCode::FAILURE;
        }
    };

    let identities = match keys::load_keypairs(&config.public_keys, &config.private_keys) {
        Ok(identities) if !identities.is_empty() => identities,
        Ok(_) => {
            error!("Node key files must be provided");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error!(error = %err, "Unable to load identity key files");
            return ExitCode::FAILURE;
        }
    };

    let client = match PeerClient::new() {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Unable to build peer HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let party = Arc::new(PartyStore::new(
        config.url.clone(),
        config.other_nodes.iter().cloned(),
    ));

    let enclave = match SecureEnclave::new(store, identities, party.clone(), client.clone()) {
        Ok(enclave) => enclave,
        Err(err) => {
            error!(error = %err, "Unable to initialise enclave");
            return ExitCode::FAILURE;
        }
    };
    party.register(&enclave.public_keys());

    let state = AppState::new(enclave);
    let shutdown = CancellationToken::new();

    // Admin (node-to-node) listener.
    let admin_addr = format!("0.0.0.0:{}", config.port);
    let admin_listener = match tokio::net::TcpListener::bind(&admin_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %admin_addr, error = %err, "Unable to bind admin listener");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %admin_addr, "Admin server listening");

    // Private API on a unix socket; a stale socket file is removed first.
    if config.socket.exists() {
        if let Err(err) = std::fs::remove_file(&config.socket) {
            error!(path = %config.socket.display(), error = %err, "Unable to remove stale socket");
            return ExitCode::FAILURE;
        }
    }
    let ipc_listener = match tokio::net::UnixListener::bind(&config.socket) {
        Ok(listener) => listener,
        Err(err) => {
            error!(path = %config.socket.display(), error = %err, "Unable to bind IPC socket");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %config.socket.display(), "IPC server listening");

    let admin_server = tokio::spawn({
        let app = admin_router(state.clone());
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = axum::serve(admin_listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!(error = %err, "Admin server failed");
            }
        }
    });

    let ipc_server = tokio::spawn({
        let app = private_router(state.clone());
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = axum::serve(ipc_listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!(error = %err, "IPC server failed");
            }
        }
    });

    let poller = PartyInfoPoller::new(party, client);
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Unable to listen for shutdown signal");
    }
    info!("Shutting down");
    shutdown.cancel();

    let _ = admin_server.await;
    let _ = ipc_server.await;
    let _ = poller_task.await;

    state.enclave().close();
    let _ = std::fs::remove_file(&config.socket);

    ExitCode::SUCCESS
}
