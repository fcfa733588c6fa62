// Catalog model
// -------------
// A catalog maps a movie title to its `Record`. Titles are unique when
// compared without regard to letter case, but the spelling that was stored
// first is the one that is kept and shown. Entries keep the order in which
// they were read or added, so listing and sorting behave predictably.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

/// Everything stored about one movie. The rating stays text on disk; use
/// [`Record::rating_value`] whenever a number is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub year: String,
    pub rating: String,
    #[serde(default)]
    pub poster: String,
}

impl Record {
    pub fn new(
        year: impl Into<String>,
        rating: impl Into<String>,
        poster: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            rating: rating.into(),
            poster: poster.into(),
        }
    }

    /// Numeric view of the rating, `None` when it is not a finite number
    /// (OMDb reports unknown ratings as "N/A").
    pub fn rating_value(&self) -> Option<f64> {
        parse_rating(&self.rating)
    }
}

/// The single place where rating text is turned into a number.
pub fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Case-insensitive title comparison used for every lookup. Folds one
/// character at a time, so nothing is allocated per comparison.
pub fn titles_match(a: &str, b: &str) -> bool {
    a == b
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

/// Ordered title → record mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<(String, Record)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries
            .iter()
            .map(|(title, record)| (title.as_str(), record))
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(stored, _)| titles_match(stored, title))
    }

    /// Find the stored spelling of `title`, ignoring case.
    pub fn resolve(&self, title: &str) -> Option<&str> {
        self.position(title)
            .map(|idx| self.entries[idx].0.as_str())
    }

    pub fn contains(&self, title: &str) -> bool {
        self.position(title).is_some()
    }

    pub fn get(&self, title: &str) -> Option<&Record> {
        self.position(title).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut Record> {
        self.position(title).map(|idx| &mut self.entries[idx].1)
    }

    /// Append a new entry. Returns `false` and leaves the catalog untouched
    /// when a title that differs only in case is already present.
    pub fn insert(&mut self, title: impl Into<String>, record: Record) -> bool {
        let title = title.into();
        if self.contains(&title) {
            return false;
        }
        self.entries.push((title, record));
        true
    }

    /// Remove an entry by case-insensitive title, returning the stored key
    /// and its record.
    pub fn remove(&mut self, title: &str) -> Option<(String, Record)> {
        self.position(title).map(|idx| self.entries.remove(idx))
    }

    /// Entries whose title contains `needle`, ignoring case.
    pub fn search(&self, needle: &str) -> Vec<(&str, &Record)> {
        let needle = needle.to_lowercase();
        self.iter()
            .filter(|(title, _)| title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Entries ordered from best to worst rating. The sort is stable, so
    /// equal ratings keep catalog order; unparsable ratings go last.
    pub fn sorted_by_rating(&self) -> Vec<(&str, &Record)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|(_, a), (_, b)| compare_ratings_desc(a, b));
        sorted
    }

    /// Mean of every rating that parses, `None` if none do.
    pub fn average_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> = self
            .entries
            .iter()
            .filter_map(|(_, record)| record.rating_value())
            .collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }

    /// Insert while loading persisted data; a later duplicate is dropped.
    pub(crate) fn insert_loaded(&mut self, title: String, record: Record) {
        if let Some(existing) = self.resolve(&title) {
            warn!(
                title = %title,
                existing = %existing,
                "duplicate title in catalog file, keeping the first entry"
            );
            return;
        }
        self.entries.push((title, record));
    }
}

fn compare_ratings_desc(a: &Record, b: &Record) -> Ordering {
    match (a.rating_value(), b.rating_value()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = (&'a str, &'a Record);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Record)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<(String, Record)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for (title, record) in iter {
            catalog.insert_loaded(title, record);
        }
        catalog
    }
}

// On disk a catalog is a JSON object keyed by title; entries are written
// and read back in catalog order.
impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (title, record) in &self.entries {
            map.serialize_entry(title, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = Catalog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping movie titles to records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
        let mut catalog = Catalog::new();
        while let Some((title, record)) = access.next_entry::<String, Record>()? {
            catalog.insert_loaded(title, record);
        }
        Ok(catalog)
    }
}
