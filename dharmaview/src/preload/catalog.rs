//! Gallery catalog as seen by the preloader.
//!
//! Only the fields needed to pick preload targets are kept: the entry id,
//! a display name and the model URL, if the entry has a model at all.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_has_model() -> bool {
    true
}

/// One gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model_url: Option<String>,
    /// False when the entry is listed but its model is not published yet.
    #[serde(default = "default_has_model", alias = "glbStatus")]
    pub has_model: bool,
}

impl CatalogEntry {
    pub fn new(id: u32, name: impl Into<String>, model_url: Option<&str>) -> Self {
        Self {
            id,
            name: name.into(),
            model_url: model_url.map(str::to_string),
            has_model: model_url.is_some(),
        }
    }

    /// Model URL, when the entry has a usable model.
    pub fn available_model(&self) -> Option<&str> {
        if !self.has_model {
            return None;
        }
        self.model_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Ordered gallery entries with lookup by id.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: Vec<CatalogEntry>,
    by_id: BTreeMap<u32, usize>,
}

impl ModelCatalog {
    /// Build a catalog. When ids repeat, the first entry wins lookups.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut by_id = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id).or_insert(index);
        }
        Self { entries, by_id }
    }

    /// Parse a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn get(&self, id: u32) -> Option<&CatalogEntry> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    /// Entries whose id falls in `ids`, in ascending id order.
    pub fn entries_in(
        &self,
        ids: RangeInclusive<u32>,
    ) -> impl DoubleEndedIterator<Item = &CatalogEntry> {
        self.by_id.range(ids).map(|(_, &index)| &self.entries[index])
    }

    /// Model URL for `id`, if that entry exists and has a model.
    pub fn model_url(&self, id: u32) -> Option<&str> {
        self.get(id).and_then(CatalogEntry::available_model)
    }

    /// Model URLs of the first `count` entries that have a model.
    pub fn popular_models(&self, count: usize) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(CatalogEntry::available_model)
            .take(count)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn models_available(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.available_model().is_some())
            .count()
    }
}
