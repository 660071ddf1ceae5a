// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-per-entry record store.
//!
//! Opt-in alternative to the embedded database: each entry is one file in a
//! flat directory. Filenames and contents are ASCII, so both key and value
//! are base64-wrapped — URL-safe alphabet for the filename (digests contain
//! `/` in standard base64), standard alphabet for the body. Writes go
//! through a temp file and rename so readers never observe a partial entry.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{STANDARD as B64, URL_SAFE_NO_PAD as B64_FILE};
use base64::Engine as _;

use super::{DataStore, StorageError, StorageResult};

const TMP_EXTENSION: &str = "tmp";

pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (or create) the store directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn entry_path(&self, key: &[u8]) -> PathBuf {
        self.root.join(B64_FILE.encode(key))
    }
}

impl DataStore for DirStore {
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let path = self.entry_path(key);
        let tmp_path = path.with_extension(TMP_EXTENSION);
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(B64.encode(value).as_bytes())?;
            file.flush()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        let path = self.entry_path(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound)
            }
            Err(err) => return Err(err.into()),
        };
        B64.decode(contents.trim())
            .map_err(|err| StorageError::Corrupt(format!("{}: {err}", path.display())))
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> StorageResult<()>,
    ) -> StorageResult<()> {
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_some_and(|ext| ext == TMP_EXTENSION) {
                continue;
            }

            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let key = B64_FILE
                .decode(name)
                .map_err(|err| StorageError::Corrupt(format!("{name}: {err}")))?;
            let value = self.get(&key)?;
            visitor(&key, &value)?;
        }
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
