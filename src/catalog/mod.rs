pub mod document;
pub mod loader;

use serde::Serialize;
use std::collections::HashSet;

/// One title in the catalog, validated at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub title: String,
    pub genre: String,
    pub overview: String,
    pub director: String,
    pub star1: String,
    pub star2: String,
    pub rating: f32,
    pub poster: String,
}

impl CatalogItem {
    /// Item with only a title and genre; handy for small hand-built catalogs.
    pub fn new(title: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            overview: String::new(),
            director: String::new(),
            star1: String::new(),
            star2: String::new(),
            rating: 0.0,
            poster: String::new(),
        }
    }
}

/// The full, ordered list of items. Ordinal position is the item's row in
/// every derived structure (documents, vectors, similarity matrix).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Row of the first item whose title matches exactly. Duplicate titles
    /// resolve to their first occurrence.
    pub fn position(&self, title: &str) -> Option<usize> {
        self.items.iter().position(|item| item.title == title)
    }

    pub fn find(&self, title: &str) -> Option<&CatalogItem> {
        self.position(title).map(|i| &self.items[i])
    }

    /// Unique titles in catalog order.
    pub fn titles(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|item| item.title.as_str())
            .filter(|title| seen.insert(*title))
            .collect()
    }

    /// Titles that are duplicated somewhere in the catalog, in order of first repeat.
    pub fn duplicate_titles(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.items
            .iter()
            .map(|item| item.title.as_str())
            .filter(|title| !seen.insert(*title) && reported.insert(*title))
            .collect()
    }

    /// Case-insensitive substring matches, used to explain an empty result.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.titles()
            .into_iter()
            .filter(|title| title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}
