// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Record Storage
//!
//! Byte-keyed, byte-valued persistence for encoded records, keyed by the
//! SHA3-512 content digest. Two backends:
//!
//! - [`record_db::RecordDb`] — embedded redb store (default).
//! - [`dir_store::DirStore`] — file-per-entry directory store that base64
//!   wraps both key and value, for deployments that want plain files.
//!
//! The enclave treats `put`/`get`/`delete` as atomic per call and assumes
//! nothing across calls.

pub mod dir_store;
pub mod record_db;

use std::path::Path;

pub use dir_store::DirStore;
pub use record_db::RecordDb;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt stored entry: {0}")]
    Corrupt(String),

    #[error("entry not found")]
    NotFound,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Operations a record store must provide. Backends own their concurrency;
/// each call is atomic in isolation.
pub trait DataStore: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Fetch the value for `key`; [`StorageError::NotFound`] if absent.
    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>>;

    /// Remove the entry for `key`; [`StorageError::NotFound`] if absent.
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Visit every entry in unspecified order. The visitor must not call
    /// back into the store; an error from the visitor aborts the scan.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> StorageResult<()>,
    ) -> StorageResult<()>;

    /// Release backend resources. Stores flush durably per call, so this
    /// is advisory.
    fn close(&self) -> StorageResult<()>;
}

/// Open the configured backend at `path`.
pub fn open_data_store(path: &Path, use_dir_store: bool) -> StorageResult<Box<dyn DataStore>> {
    if use_dir_store {
        Ok(Box::new(DirStore::open(path)?))
    } else {
        Ok(Box::new(RecordDb::open(path)?))
    }
}
