use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{read_if_exists, write_atomic, CatalogStore, StorageError};
use crate::catalog::{Catalog, Record};

/// Column order on disk. `rating` comes before `year` here even though the
/// JSON records list `year` first; existing files depend on it.
const HEADER: [&str; 4] = ["title", "rating", "year", "poster"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    title: String,
    rating: String,
    year: String,
    #[serde(default)]
    poster: String,
}

/// Catalog stored as a CSV table with a mandatory header row.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, raw: &[u8]) -> Catalog {
        let mut reader = ::csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(raw);
        let mut catalog = Catalog::new();
        for row in reader.deserialize::<CsvRow>() {
            match row {
                Ok(row) => catalog.insert_loaded(
                    row.title,
                    Record {
                        year: row.year,
                        rating: row.rating,
                        poster: row.poster,
                    },
                ),
                // One bad row must not cost the rest of the catalog.
                Err(err) => warn!(
                    path = %self.path.display(),
                    line = err.position().map(|p| p.line()),
                    error = %err,
                    "skipping malformed CSV row"
                ),
            }
        }
        catalog
    }

    fn encode(catalog: &Catalog) -> Result<Vec<u8>, ::csv::Error> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for (title, record) in catalog {
            writer.write_record([
                title,
                record.rating.as_str(),
                record.year.as_str(),
                record.poster.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| ::csv::Error::from(e.into_error()))
    }
}

impl CatalogStore for CsvStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Catalog, StorageError> {
        let Some(raw) = read_if_exists(&self.path)? else {
            return Ok(Catalog::new());
        };
        let catalog = self.parse(&raw);
        debug!(path = %self.path.display(), movies = catalog.len(), "loaded CSV catalog");
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let bytes = Self::encode(catalog).map_err(|e| StorageError::Encode(e.to_string()))?;
        write_atomic(&self.path, &bytes).map_err(|e| StorageError::io(&self.path, e))?;
        debug!(path = %self.path.display(), movies = catalog.len(), "saved CSV catalog");
        Ok(())
    }
}
