//! JSON-file pick store with an in-memory cache.
//!
//! Picks live in a single JSON document mapping `"round:seat"` keys to item
//! keys. The file is rewritten on every pick; drafts are small enough that a
//! full rewrite is simpler and safer than appending.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;

use super::PickStore;
use crate::domain::ItemKey;
use crate::error::{DraftError, Result};

pub struct JsonPickStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, ItemKey>>,
}

fn slot_key(round: usize, seat: usize) -> String {
    format!("{round}:{seat}")
}

impl JsonPickStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cache = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };

        debug!("Opened pick store at {} ({} picks)", path.display(), cache.len());
        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    fn persist(&self, picks: &HashMap<String, ItemKey>) -> Result<()> {
        let content = serde_json::to_string_pretty(picks)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl PickStore for JsonPickStore {
    async fn read_pick(&self, round: usize, seat: usize) -> Result<Option<ItemKey>> {
        let cache = self
            .cache
            .read()
            .map_err(|e| DraftError::Store(e.to_string()))?;
        Ok(cache.get(&slot_key(round, seat)).cloned())
    }

    async fn write_pick(&self, round: usize, seat: usize, item: &ItemKey) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| DraftError::Store(e.to_string()))?;
        cache.insert(slot_key(round, seat), item.clone());
        // File first write-through keeps the document the source of truth
        self.persist(&cache)?;
        Ok(())
    }
}
