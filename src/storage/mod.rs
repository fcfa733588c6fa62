// Storage layer
// -------------
// `CatalogStore` is the interface the menu talks to. Each backend owns one
// file and only knows how to load and save a whole `Catalog`; the
// list/add/delete/update operations are shared and always work as
// read-modify-write over the full file. Nothing is cached between calls, so
// every operation sees what is currently on disk.

mod csv;
mod json;

pub use self::csv::CsvStore;
pub use self::json::JsonStore;

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Record};

/// Errors reported by catalog mutations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No stored title matches, ignoring case.
    #[error("'{0}' not found in movie list")]
    NotFound(String),

    /// A title that differs only in case is already stored.
    #[error("movie '{0}' already exists")]
    AlreadyExists(String),

    /// The catalog file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The catalog could not be turned into its on-disk format.
    #[error("failed to encode catalog: {0}")]
    Encode(String),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persistence interface shared by every backend.
pub trait CatalogStore {
    /// File this store reads and writes.
    fn path(&self) -> &Path;

    /// Read the whole catalog. A missing or malformed file is an empty
    /// catalog; only other I/O failures are errors.
    fn load(&self) -> Result<Catalog, StorageError>;

    /// Replace the file with `catalog`, all or nothing.
    fn save(&self, catalog: &Catalog) -> Result<(), StorageError>;

    /// Every stored movie. Never fails: any read problem yields an empty
    /// catalog so the session keeps going. The "no movies" messages in the
    /// menu depend on this, so do not turn it into an error.
    fn list(&self) -> Catalog {
        match self.load() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "could not read catalog, showing it as empty");
                Catalog::new()
            }
        }
    }

    /// Store a new movie under the exact `title` given.
    fn add(&self, title: &str, record: Record) -> Result<(), StorageError> {
        let mut catalog = self.load()?;
        if let Some(existing) = catalog.resolve(title) {
            return Err(StorageError::AlreadyExists(existing.to_string()));
        }
        catalog.insert(title, record);
        self.save(&catalog)?;
        info!(title, "movie added");
        Ok(())
    }

    /// Remove a movie, returning the title as it was stored.
    fn delete(&self, title: &str) -> Result<String, StorageError> {
        let mut catalog = self.load()?;
        let (stored, _) = catalog
            .remove(title)
            .ok_or_else(|| StorageError::NotFound(title.to_string()))?;
        self.save(&catalog)?;
        info!(title = %stored, "movie deleted");
        Ok(stored)
    }

    /// Overwrite only the rating of a movie, returning the stored title.
    fn update(&self, title: &str, rating: &str) -> Result<String, StorageError> {
        let mut catalog = self.load()?;
        let stored = catalog
            .resolve(title)
            .map(str::to_string)
            .ok_or_else(|| StorageError::NotFound(title.to_string()))?;
        if let Some(record) = catalog.get_mut(&stored) {
            record.rating = rating.to_string();
        }
        self.save(&catalog)?;
        info!(title = %stored, rating, "movie rating updated");
        Ok(stored)
    }
}

/// Which file format backs the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Json,
    Csv,
}

impl StorageKind {
    pub fn default_path(self) -> PathBuf {
        match self {
            StorageKind::Json => PathBuf::from("data/movies.json"),
            StorageKind::Csv => PathBuf::from("data/movies.csv"),
        }
    }
}

/// Build the backend selected at startup.
pub fn open_store(kind: StorageKind, path: impl Into<PathBuf>) -> Box<dyn CatalogStore> {
    let path = path.into();
    debug!(?kind, path = %path.display(), "opening catalog store");
    match kind {
        StorageKind::Json => Box::new(JsonStore::new(path)),
        StorageKind::Csv => Box::new(CsvStore::new(path)),
    }
}

/// Read a file's raw bytes, treating "does not exist" as `None`. Decoding
/// is left to the backend so bad text counts as malformed data, not I/O.
pub(crate) fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match fs::read(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "catalog file does not exist yet");
            Ok(None)
        }
        Err(err) => Err(StorageError::io(path, err)),
    }
}

/// Write `contents` to a sibling temp file and rename it over `path`, so a
/// failed write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let result = write_and_rename(&tmp, path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_and_rename(tmp: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("catalog"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("movies.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn write_atomic_replaces_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        fs::write(&path, "old content that is longer").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movies.json");
        fs::write(&path, "previous").unwrap();
        // A directory squatting on the temp name makes the write fail.
        fs::create_dir(temp_path(&path)).unwrap();
        assert!(write_atomic(&path, b"next").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn read_if_exists_maps_missing_file_to_none() {
        let dir = tempdir().unwrap();
        assert!(read_if_exists(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn read_if_exists_returns_bytes_that_are_not_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        fs::write(&path, b"Am\xe9lie").unwrap();
        assert_eq!(read_if_exists(&path).unwrap(), Some(b"Am\xe9lie".to_vec()));
    }

    #[test]
    fn read_if_exists_reports_other_io_errors() {
        let dir = tempdir().unwrap();
        let err = read_if_exists(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn open_store_selects_backend_by_kind() {
        let store = open_store(StorageKind::Csv, "movies.csv");
        assert_eq!(store.path(), Path::new("movies.csv"));
        assert_eq!(StorageKind::Json.default_path(), PathBuf::from("data/movies.json"));
    }
}
