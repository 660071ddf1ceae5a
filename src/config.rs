// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Relative paths
//! (socket, storage, key files, TLS material) resolve under `WORK_DIR`.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NODE_URL` | Own endpoint as advertised to peers | Required |
//! | `PORT` | Admin (node-to-node) listener port | Required |
//! | `IPC_SOCKET` | Private API unix socket path | `relay.ipc` |
//! | `WORK_DIR` | Base directory for relative paths | `.` |
//! | `OTHER_NODES` | Comma-separated boot peer URLs | empty |
//! | `PUBLIC_KEYS` | Comma-separated public key files | Required |
//! | `PRIVATE_KEYS` | Comma-separated private key files (paired) | Required |
//! | `STORAGE_FILE` | Record store file/directory name | `relay.db` |
//! | `DIR_STORAGE` | `true` selects the directory backend | `false` |
//! | `VERBOSITY` | Log level 0-3 (error/warn/info/debug) | `1` |
//! | `TLS` | Require TLS certificate material | `false` |
//! | `TLS_SERVER_CERT` | Server certificate path | with `TLS` |
//! | `TLS_SERVER_KEY` | Server private key path | with `TLS` |
//! | `TLS_SERVER_TRUST` | Trust store path | Optional |
//! | `GENERATE_KEYS` | Keypair base name; generate and exit | — |
//!
//! `RUST_LOG` overrides the `VERBOSITY` mapping when set.

use std::env;
use std::path::{Path, PathBuf};

pub const URL_ENV: &str = "NODE_URL";
pub const PORT_ENV: &str = "PORT";
pub const SOCKET_ENV: &str = "IPC_SOCKET";
pub const WORK_DIR_ENV: &str = "WORK_DIR";
pub const OTHER_NODES_ENV: &str = "OTHER_NODES";
pub const PUBLIC_KEYS_ENV: &str = "PUBLIC_KEYS";
pub const PRIVATE_KEYS_ENV: &str = "PRIVATE_KEYS";
pub const STORAGE_ENV: &str = "STORAGE_FILE";
pub const DIR_STORAGE_ENV: &str = "DIR_STORAGE";
pub const VERBOSITY_ENV: &str = "VERBOSITY";
pub const TLS_ENV: &str = "TLS";
pub const TLS_SERVER_CERT_ENV: &str = "TLS_SERVER_CERT";
pub const TLS_SERVER_KEY_ENV: &str = "TLS_SERVER_KEY";
pub const TLS_SERVER_TRUST_ENV: &str = "TLS_SERVER_TRUST";
pub const GENERATE_KEYS_ENV: &str = "GENERATE_KEYS";

const DEFAULT_SOCKET: &str = "relay.ipc";
const DEFAULT_STORAGE: &str = "relay.db";
const DEFAULT_VERBOSITY: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{URL_ENV} must be specified")]
    MissingUrl,

    #[error("{PORT_ENV} must be specified")]
    MissingPort,

    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("node key files must be provided")]
    MissingKeys,

    #[error("private keys provided must have corresponding public keys")]
    UnpairedKeys,

    #[error("TLS requires {TLS_SERVER_CERT_ENV} and {TLS_SERVER_KEY_ENV}")]
    MissingTlsMaterial,
}

/// TLS certificate material locations, validated for existence at startup.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
    pub server_trust: Option<PathBuf>,
}

/// What the process was asked to do.
#[derive(Debug)]
pub enum RunMode {
    /// Generate a keypair at the given base path, then exit.
    GenerateKeys(PathBuf),
    /// Run the relay with the given configuration.
    Serve(Box<Config>),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub port: u16,
    pub socket: PathBuf,
    pub work_dir: PathBuf,
    pub other_nodes: Vec<String>,
    pub public_keys: Vec<PathBuf>,
    pub private_keys: Vec<PathBuf>,
    pub storage_path: PathBuf,
    pub dir_storage: bool,
    pub verbosity: u8,
    pub tls: Option<TlsConfig>,
}

impl Config {
    /// Load the run mode from process environment variables.
    pub fn from_env() -> Result<RunMode, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary lookup. Split out from [`Config::from_env`]
    /// so validation is testable without touching process state.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<RunMode, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let work_dir = PathBuf::from(get(WORK_DIR_ENV).unwrap_or_else(|| ".".to_string()));

        if let Some(base) = get(GENERATE_KEYS_ENV) {
            return Ok(RunMode::GenerateKeys(resolve(&work_dir, &base)));
        }

        let url = get(URL_ENV).ok_or(ConfigError::MissingUrl)?;
        let port = get(PORT_ENV)
            .ok_or(ConfigError::MissingPort)?
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: get(PORT_ENV).unwrap_or_default(),
            })?;

        let public_keys = split_paths(&work_dir, get(PUBLIC_KEYS_ENV));
        let private_keys = split_paths(&work_dir, get(PRIVATE_KEYS_ENV));
        if public_keys.is_empty() {
            return Err(ConfigError::MissingKeys);
        }
        if public_keys.len() != private_keys.len() {
            return Err(ConfigError::UnpairedKeys);
        }

        let verbosity = match get(VERBOSITY_ENV) {
            Some(value) => value.parse::<u8>().ok().filter(|v| *v <= 3).ok_or(
                ConfigError::Invalid {
                    name: VERBOSITY_ENV,
                    value,
                },
            )?,
            None => DEFAULT_VERBOSITY,
        };

        let tls = if parse_bool(get(TLS_ENV)) {
            let server_cert = get(TLS_SERVER_CERT_ENV).ok_or(ConfigError::MissingTlsMaterial)?;
            let server_key = get(TLS_SERVER_KEY_ENV).ok_or(ConfigError::MissingTlsMaterial)?;
            Some(TlsConfig {
                server_cert: resolve(&work_dir, &server_cert),
                server_key: resolve(&work_dir, &server_key),
                server_trust: get(TLS_SERVER_TRUST_ENV)
                    .map(|trust| resolve(&work_dir, &trust)),
            })
        } else {
            None
        };

        let config = Config {
            socket: resolve(
                &work_dir,
                &get(SOCKET_ENV).unwrap_or_else(|| DEFAULT_SOCKET.to_string()),
            ),
            storage_path: resolve(
                &work_dir,
                &get(STORAGE_ENV).unwrap_or_else(|| DEFAULT_STORAGE.to_string()),
            ),
            other_nodes: get(OTHER_NODES_ENV)
                .map(|nodes| {
                    nodes
                        .split(',')
                        .map(str::trim)
                        .filter(|node| !node.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            dir_storage: parse_bool(get(DIR_STORAGE_ENV)),
            url,
            port,
            work_dir,
            public_keys,
            private_keys,
            verbosity,
            tls,
        };

        Ok(RunMode::Serve(Box::new(config)))
    }

    /// The `tracing` filter directive for the configured verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
    }
}

fn parse_bool(value: Option<String>) -> bool {
    matches!(value.as_deref(), Some("true") | Some("1"))
}

fn resolve(work_dir: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        work_dir.join(path)
    }
}

fn split_paths(work_dir: &Path, value: Option<String>) -> Vec<PathBuf> {
    value
        .map(|paths| {
            paths
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(|path| resolve(work_dir, path))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name| map.get(name).map(|value| value.to_string())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            (URL_ENV, "http://127.0.0.1:9001/"),
            (PORT_ENV, "9001"),
            (PUBLIC_KEYS_ENV, "node.pub"),
            (PRIVATE_KEYS_ENV, "node.key"),
        ]
    }

    #[test]
    fn minimal_configuration_serves_with_defaults() {
        let mode = Config::from_lookup(lookup(&minimal())).unwrap();
        let RunMode::Serve(config) = mode else {
            panic!("expected serve mode");
        };

        assert_eq!(config.url, "http://127.0.0.1:9001/");
        assert_eq!(config.port, 9001);
        assert_eq!(config.socket, PathBuf::from("./relay.ipc"));
        assert_eq!(config.storage_path, PathBuf::from("./relay.db"));
        assert!(!config.dir_storage);
        assert_eq!(config.verbosity, 1);
        assert!(config.tls.is_none());
        assert!(config.other_nodes.is_empty());
    }

    #[test]
    fn missing_url_or_port_is_fatal() {
        let mut pairs = minimal();
        pairs.retain(|(name, _)| *name != URL_ENV);
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::MissingUrl)
        ));

        let mut pairs = minimal();
        pairs.retain(|(name, _)| *name != PORT_ENV);
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::MissingPort)
        ));
    }

    #[test]
    fn key_lists_must_pair_up() {
        let mut pairs = minimal();
        pairs.retain(|(name, _)| *name != PRIVATE_KEYS_ENV);
        pairs.push((PRIVATE_KEYS_ENV, "one.key,two.key"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::UnpairedKeys)
        ));

        let mut pairs = minimal();
        pairs.retain(|(name, _)| !matches!(*name, PUBLIC_KEYS_ENV | PRIVATE_KEYS_ENV));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::MissingKeys)
        ));
    }

    #[test]
    fn relative_paths_resolve_under_work_dir() {
        let mut pairs = minimal();
        pairs.push((WORK_DIR_ENV, "/var/lib/relay"));
        pairs.push((SOCKET_ENV, "sockets/relay.ipc"));
        pairs.push((STORAGE_ENV, "/mnt/records.db"));

        let RunMode::Serve(config) = Config::from_lookup(lookup(&pairs)).unwrap() else {
            panic!("expected serve mode");
        };
        assert_eq!(config.socket, PathBuf::from("/var/lib/relay/sockets/relay.ipc"));
        assert_eq!(config.storage_path, PathBuf::from("/mnt/records.db"));
        assert_eq!(
            config.public_keys,
            vec![PathBuf::from("/var/lib/relay/node.pub")]
        );
    }

    #[test]
    fn other_nodes_split_on_commas() {
        let mut pairs = minimal();
        pairs.push((OTHER_NODES_ENV, "http://b:9002/, http://c:9003/,"));

        let RunMode::Serve(config) = Config::from_lookup(lookup(&pairs)).unwrap() else {
            panic!("expected serve mode");
        };
        assert_eq!(
            config.other_nodes,
            vec!["http://b:9002/".to_string(), "http://c:9003/".to_string()]
        );
    }

    #[test]
    fn generate_keys_short_circuits_validation() {
        // No URL or port needed when only generating keys.
        let pairs = vec![(GENERATE_KEYS_ENV, "keys/node")];
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Ok(RunMode::GenerateKeys(path)) if path == PathBuf::from("./keys/node")
        ));
    }

    #[test]
    fn tls_requires_cert_and_key() {
        let mut pairs = minimal();
        pairs.push((TLS_ENV, "true"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::MissingTlsMaterial)
        ));

        pairs.push((TLS_SERVER_CERT_ENV, "tls/server.crt"));
        pairs.push((TLS_SERVER_KEY_ENV, "tls/server.key"));
        let RunMode::Serve(config) = Config::from_lookup(lookup(&pairs)).unwrap() else {
            panic!("expected serve mode");
        };
        let tls = config.tls.expect("tls config");
        assert_eq!(tls.server_cert, PathBuf::from("./tls/server.crt"));
        assert_eq!(tls.server_trust, None);
    }

    #[test]
    fn verbosity_maps_to_filter_levels() {
        for (verbosity, filter) in [("0", "error"), ("1", "warn"), ("2", "info"), ("3", "debug")] {
            let mut pairs = minimal();
            pairs.push((VERBOSITY_ENV, verbosity));
            let RunMode::Serve(config) = Config::from_lookup(lookup(&pairs)).unwrap() else {
                panic!("expected serve mode");
            };
            assert_eq!(config.log_filter(), filter);
        }

        let mut pairs = minimal();
        pairs.push((VERBOSITY_ENV, "9"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
