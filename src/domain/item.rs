//! Item catalog and the shared remaining pool.

use serde::{Deserialize, Serialize};

/// Identifier for a draftable item (a team number, a card id, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(pub String);

impl ItemKey {
    /// Create a key from anything string-like
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ItemKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A draftable item: immutable key plus a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    pub label: String,
}

impl Item {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: ItemKey::new(key),
            label: label.into(),
        }
    }
}

/// The shared pool: the full catalog plus the keys still available.
///
/// Picked items leave `remaining` but stay in the catalog, so they remain
/// referenceable for display after the draft moves on.
#[derive(Debug, Clone)]
pub struct ItemPool {
    catalog: Vec<Item>,
    remaining: Vec<ItemKey>,
}

impl ItemPool {
    /// Build a pool with everything available.
    pub fn new(catalog: Vec<Item>) -> Self {
        let remaining = catalog.iter().map(|item| item.key.clone()).collect();
        Self { catalog, remaining }
    }

    pub fn catalog(&self) -> &[Item] {
        &self.catalog
    }

    pub fn remaining(&self) -> &[ItemKey] {
        &self.remaining
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }

    /// Catalog entries still available, in catalog order.
    pub fn remaining_items(&self) -> Vec<Item> {
        self.catalog
            .iter()
            .filter(|item| self.remaining.contains(&item.key))
            .cloned()
            .collect()
    }

    pub fn is_available(&self, key: &ItemKey) -> bool {
        self.remaining.contains(key)
    }

    /// Remove a key from the remaining set. Returns false if it was already
    /// taken (or never existed), leaving the pool untouched.
    pub fn take(&mut self, key: &ItemKey) -> bool {
        match self.remaining.iter().position(|k| k == key) {
            Some(pos) => {
                self.remaining.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Display label for a key, if it is in the catalog.
    pub fn label(&self, key: &ItemKey) -> Option<&str> {
        self.catalog
            .iter()
            .find(|item| &item.key == key)
            .map(|item| item.label.as_str())
    }
}
