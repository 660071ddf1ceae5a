// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record store backed by redb (pure Rust, ACID).
//!
//! One table: `records`, digest bytes → encoded record bytes. Every
//! mutation runs in its own write transaction, so a record is durable
//! before its digest is ever handed back to a caller.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{DataStore, StorageError, StorageResult};

/// Primary table: content digest → encoded record.
const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

pub struct RecordDb {
    db: Database,
}

impl RecordDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl DataStore for RecordDb {
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            let _previous = table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        match table.get(key)? {
            Some(guard) => Ok(guard.value().to_vec()),
            None => Err(StorageError::NotFound),
        }
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(RECORDS)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;

        if existed {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        for entry in table.iter()? {
            let (key, value) = entry?;
            visitor(key.value(), value.value())?;
        }
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        // redb commits durably per transaction; dropping the handle is
        // sufficient.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn test_db() -> (RecordDb, PathBuf) {
        let dir = env::temp_dir().join(format!("test-recorddb-{}", uuid::Uuid::new_v4()));
        let db = RecordDb::open(&dir.join("records.redb")).expect("Failed to open test db");
        (db, dir)
    }

    #[test]
    fn put_get_delete_roundtrip() {
        let (db, dir) = test_db();
        let key = [0x00u8, 0xFF, 0x10, 0x2F];
        let value = b"\x00binary\xFFvalue";

        db.put(&key, value).unwrap();
        assert_eq!(db.get(&key).unwrap(), value);

        db.delete(&key).unwrap();
        assert!(matches!(db.get(&key), Err(StorageError::NotFound)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_of_absent_key_is_not_found() {
        let (db, dir) = test_db();
        assert!(matches!(db.delete(b"missing"), Err(StorageError::NotFound)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn put_overwrites() {
        let (db, dir) = test_db();
        db.put(b"k", b"one").unwrap();
        db.put(b"k", b"two").unwrap();
        assert_eq!(db.get(b"k").unwrap(), b"two");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn scan_visits_every_entry() {
        let (db, dir) = test_db();
        for i in 0u8..5 {
            db.put(&[i], &[i, i]).unwrap();
        }

        let mut seen = Vec::new();
        db.scan(&mut |key, value| {
            seen.push((key.to_vec(), value.to_vec()));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 5);
        for i in 0u8..5 {
            assert!(seen.contains(&(vec![i], vec![i, i])));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn visitor_error_aborts_scan() {
        let (db, dir) = test_db();
        for i in 0u8..5 {
            db.put(&[i], &[i]).unwrap();
        }

        let mut visited = 0;
        let result = db.scan(&mut |_, _| {
            visited += 1;
            if visited == 2 {
                Err(StorageError::Corrupt("boom".into()))
            } else {
                Ok(())
            }
        });

        assert!(result.is_err());
        assert_eq!(visited, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
