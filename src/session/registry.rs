//! Session registry - one control handle per running draft, keyed by event
//! id. Sessions never share mutable draft state; the registry only holds the
//! stop/skip plumbing and a read-only progress snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::error::{DraftError, Result};

/// Read-only snapshot of where a session currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProgress {
    pub round: usize,
    pub drafter: String,
    pub picks_made: usize,
}

/// Control handle for one running draft session.
#[derive(Debug, Clone)]
pub struct SessionControl {
    stop_tx: watch::Sender<bool>,
    skip_tx: mpsc::Sender<()>,
    progress: Arc<Mutex<SessionProgress>>,
}

impl SessionControl {
    pub(crate) fn new(
        stop_tx: watch::Sender<bool>,
        skip_tx: mpsc::Sender<()>,
        progress: Arc<Mutex<SessionProgress>>,
    ) -> Self {
        Self {
            stop_tx,
            skip_tx,
            progress,
        }
    }

    /// Request session termination. Terminal: the session never opens
    /// another pick opportunity after observing this.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Skip the current drafter's turn. A press landing between pick
    /// opportunities is discarded, matching a skip button that resets per
    /// pick.
    pub async fn skip(&self) {
        let _ = self.skip_tx.send(()).await;
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> SessionProgress {
        self.progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

/// Registry of running sessions, keyed by event id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionControl>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session's control handle. Rejects a second session for the
    /// same event id.
    pub fn register(&self, event_id: &str, control: SessionControl) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| DraftError::InvalidConfig(e.to_string()))?;
        if sessions.contains_key(event_id) {
            return Err(DraftError::DuplicateSession(event_id.to_string()));
        }
        info!(event_id, "registering draft session");
        sessions.insert(event_id.to_string(), control);
        Ok(())
    }

    /// Drop a session from the registry (normally once its task finishes).
    pub fn remove(&self, event_id: &str) -> Option<SessionControl> {
        self.sessions
            .lock()
            .ok()
            .and_then(|mut sessions| sessions.remove(event_id))
    }

    pub fn get(&self, event_id: &str) -> Option<SessionControl> {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(event_id).cloned())
    }

    /// Stop a running session by event id.
    pub fn stop(&self, event_id: &str) -> Result<()> {
        match self.get(event_id) {
            Some(control) => {
                control.stop();
                Ok(())
            }
            None => Err(DraftError::SessionNotFound(event_id.to_string())),
        }
    }

    /// Event ids and progress of every running session.
    pub fn list(&self) -> Vec<(String, SessionProgress)> {
        self.sessions
            .lock()
            .map(|sessions| {
                let mut entries: Vec<_> = sessions
                    .iter()
                    .map(|(id, control)| (id.clone(), control.progress()))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                entries
            })
            .unwrap_or_default()
    }
}
