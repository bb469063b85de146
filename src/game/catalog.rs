//! Word catalog: the read-only category → words mapping.
//!
//! Built once at startup and shared behind an `Arc`; nothing mutates it
//! afterwards, so concurrent reads need no locking.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;

use super::types::GameError;

const BUILTIN_WORDS: &str = include_str!("../../data/words.json");

/// Errors raised while loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read word catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed word catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("word catalog has no categories")]
    Empty,

    #[error("category has no words: {0}")]
    EmptyCategory(String),
}

/// Immutable mapping from category name to candidate words.
#[derive(Clone, Debug)]
pub struct WordCatalog {
    words: BTreeMap<String, Vec<String>>,
}

impl WordCatalog {
    /// Build from an in-memory mapping. Blank words are dropped; a category
    /// left with no words is an error.
    pub fn new(words: BTreeMap<String, Vec<String>>) -> Result<Self, CatalogError> {
        if words.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut cleaned = BTreeMap::new();
        for (category, list) in words {
            let list: Vec<String> = list
                .into_iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
            if list.is_empty() {
                return Err(CatalogError::EmptyCategory(category));
            }
            cleaned.insert(category, list);
        }
        Ok(Self { words: cleaned })
    }

    /// Parse a `{ "category": ["word", ...] }` JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let words: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::new(words)
    }

    /// Load a JSON catalog from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The catalog shipped with the binary (`data/words.json`).
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_WORDS)
    }

    /// All category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.words.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.words.contains_key(category)
    }

    /// Draw a word uniformly at random from `category`.
    pub fn pick_word<R: Rng + ?Sized>(
        &self,
        category: &str,
        rng: &mut R,
    ) -> Result<String, GameError> {
        self.words
            .get(category)
            .and_then(|list| list.choose(rng))
            .cloned()
            .ok_or_else(|| GameError::UnknownCategory(category.to_string()))
    }
}
