//! Pick persistence - prior picks are read at startup, every new pick is
//! written before the draft advances.
//!
//! The store is the source of truth for made picks. The scheduler keeps no
//! resumable state of its own; restarting a draft rebuilds the board from
//! whatever the store holds.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ItemKey;
use crate::error::{DraftError, Result};

pub mod json;

pub use json::JsonPickStore;

/// Persistent pick slots, addressed by (round, seat).
#[async_trait]
pub trait PickStore: Send + Sync {
    /// Read a previously made pick, if any.
    async fn read_pick(&self, round: usize, seat: usize) -> Result<Option<ItemKey>>;

    /// Record a pick. Called synchronously on every resolution, before the
    /// draft cursor moves.
    async fn write_pick(&self, round: usize, seat: usize, item: &ItemKey) -> Result<()>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPickStore {
    picks: Mutex<HashMap<(usize, usize), ItemKey>>,
}

impl MemoryPickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a pick, as if a prior run had made it.
    pub fn seed(&self, round: usize, seat: usize, item: ItemKey) {
        if let Ok(mut picks) = self.picks.lock() {
            picks.insert((round, seat), item);
        }
    }

    /// Number of picks currently held.
    pub fn len(&self) -> usize {
        self.picks.lock().map(|picks| picks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PickStore for MemoryPickStore {
    async fn read_pick(&self, round: usize, seat: usize) -> Result<Option<ItemKey>> {
        let picks = self
            .picks
            .lock()
            .map_err(|e| DraftError::Store(e.to_string()))?;
        Ok(picks.get(&(round, seat)).cloned())
    }

    async fn write_pick(&self, round: usize, seat: usize, item: &ItemKey) -> Result<()> {
        let mut picks = self
            .picks
            .lock()
            .map_err(|e| DraftError::Store(e.to_string()))?;
        picks.insert((round, seat), item.clone());
        Ok(())
    }
}
