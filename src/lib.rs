// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Relay - Private Transaction Enclave
//!
//! This crate provides the private-transaction relay for a permissioned
//! blockchain fabric: payloads are encrypted once per submission, sealed to
//! each intended recipient, stored under a content digest, and propagated
//! node-to-node with best-effort delivery. Membership is learned through a
//! periodic party-info gossip exchange.
//!
//! ## Modules
//!
//! - `api` - HTTP surfaces (Axum): admin node-to-node and private IPC
//! - `client` - outbound peer HTTP client
//! - `codec` - length-prefixed binary wire format
//! - `crypto` - sealed/secret boxes, digests, shared-key derivation
//! - `enclave` - store/retrieve/fan-out core
//! - `gossip` - periodic party-info poller
//! - `keys` - identity key material and key files
//! - `partyinfo` - peer membership and key resolver state
//! - `storage` - digest-keyed record stores (redb, directory)

pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod enclave;
pub mod error;
pub mod gossip;
pub mod keycache;
pub mod keys;
pub mod models;
pub mod partyinfo;
pub mod state;
pub mod storage;
