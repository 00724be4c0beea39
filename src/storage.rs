//! Filesystem storage for rendered digests.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write digest {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory of dated digest files.
///
/// One file per day; writing the same day twice replaces the earlier file.
pub struct DigestStore {
    dir: PathBuf,
}

impl DigestStore {
    /// Open the output directory, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// File name for a digest written on `date`
    pub fn file_name(date: NaiveDate) -> String {
        format!("digest_{}.md", date.format("%Y-%m-%d"))
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::file_name(date))
    }

    /// Write the digest for `date` and return its path
    pub fn store(&self, date: NaiveDate, markdown: &str) -> Result<PathBuf, StorageError> {
        let path = self.path_for(date);
        std::fs::write(&path, markdown).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn file_name_embeds_iso_date() {
        assert_eq!(DigestStore::file_name(date()), "digest_2024-03-09.md");
    }

    #[test]
    fn open_creates_nested_directory_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out").join("digests");

        DigestStore::open(&dir).unwrap();
        DigestStore::open(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn same_day_write_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DigestStore::open(tmp.path()).unwrap();

        store.store(date(), "first").unwrap();
        let path = store.store(date(), "second").unwrap();

        assert_eq!(path, tmp.path().join("digest_2024-03-09.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn open_fails_when_path_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, "x").unwrap();

        assert!(matches!(
            DigestStore::open(&file),
            Err(StorageError::CreateDir { .. })
        ));
    }
}
