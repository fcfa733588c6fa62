use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{read_if_exists, write_atomic, CatalogStore, StorageError};
use crate::catalog::Catalog;

/// Catalog stored as a JSON object of `{ "year", "rating", "poster" }`
/// records keyed by title.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogStore for JsonStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Catalog, StorageError> {
        let Some(raw) = read_if_exists(&self.path)? else {
            return Ok(Catalog::new());
        };
        match serde_json::from_slice::<Catalog>(&raw) {
            Ok(catalog) => {
                debug!(path = %self.path.display(), movies = catalog.len(), "loaded JSON catalog");
                Ok(catalog)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "malformed JSON catalog, treating it as empty"
                );
                Ok(Catalog::new())
            }
        }
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        catalog
            .serialize(&mut serializer)
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        buf.push(b'\n');
        write_atomic(&self.path, &buf).map_err(|e| StorageError::io(&self.path, e))?;
        debug!(path = %self.path.display(), movies = catalog.len(), "saved JSON catalog");
        Ok(())
    }
}
