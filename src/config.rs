//! Configuration: process-wide settings plus per-event draft specs.
//!
//! `Config` loads from YAML with a fallback chain (explicit path, then the
//! user config dir, then the working directory, then defaults). An
//! `EventSpec` file describes one draftable event: its id, end instant,
//! participants in seat order, and the item catalog.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Item;
use crate::error::{DraftError, Result};
use crate::membership::ChannelScope;
use crate::session::SessionSetup;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub draft: DraftConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Rounds per participant
    pub num_picks: usize,
    /// Deadline rounding granularity; zero disables snapping
    pub snap_interval_minutes: u32,
    /// Reminder offsets before each deadline, in minutes
    pub reminder_offsets_minutes: Vec<i64>,
    /// Daily active hours, `%H:%M` or `%H:%M:%S`
    pub active_start: String,
    pub active_end: String,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            num_picks: 3,
            snap_interval_minutes: 15,
            reminder_offsets_minutes: vec![120, 30],
            active_start: "10:00".to_string(),
            active_end: "22:00".to_string(),
        }
    }
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| DraftError::InvalidConfig(format!("invalid time of day: {value}")))
}

impl DraftConfig {
    /// Parsed and validated active hours.
    pub fn active_hours(&self) -> Result<(NaiveTime, NaiveTime)> {
        let start = parse_time_of_day(&self.active_start)?;
        let end = parse_time_of_day(&self.active_end)?;
        if start >= end {
            return Err(DraftError::InvalidConfig(format!(
                "active hours end {} is not after start {}",
                self.active_end, self.active_start
            )));
        }
        Ok((start, end))
    }

    pub fn reminder_offsets(&self) -> Vec<TimeDelta> {
        self.reminder_offsets_minutes
            .iter()
            .map(|minutes| TimeDelta::minutes(*minutes))
            .collect()
    }

    /// Combine this config with an event spec into a ready session setup.
    pub fn session_setup(&self, event: &EventSpec) -> Result<SessionSetup> {
        let (active_start, active_end) = self.active_hours()?;
        Ok(SessionSetup {
            event_id: event.event_id.clone(),
            scope: ChannelScope::new(event.event_id.clone()),
            participants: event.participants.clone(),
            items: event.items.clone(),
            draft_end: event.draft_end,
            num_picks: self.num_picks,
            active_start,
            active_end,
            snap_interval_minutes: self.snap_interval_minutes,
            reminder_offsets: self.reminder_offsets(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one pick file per event id
    pub picks_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            picks_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("draftr")
                .join("picks"),
        }
    }
}

impl StoreConfig {
    /// Pick file path for one event.
    pub fn picks_path(&self, event_id: &str) -> PathBuf {
        self.picks_dir.join(format!("{event_id}.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            draft: DraftConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// One draftable event: id, deadline, roster in seat order, item catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    pub event_id: String,
    pub draft_end: DateTime<Utc>,
    pub participants: Vec<String>,
    pub items: Vec<Item>,
}

impl EventSpec {
    /// Load and validate an event file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let spec: Self = serde_yaml::from_str(&content)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_id.trim().is_empty() {
            return Err(DraftError::InvalidConfig("event_id is empty".to_string()));
        }
        if self.participants.is_empty() {
            return Err(DraftError::InvalidConfig(
                "event has no participants".to_string(),
            ));
        }
        let mut names = self.participants.clone();
        names.sort();
        names.dedup();
        if names.len() != self.participants.len() {
            return Err(DraftError::InvalidConfig(
                "duplicate participant names".to_string(),
            ));
        }
        let mut keys: Vec<_> = self.items.iter().map(|item| &item.key).collect();
        keys.sort();
        keys.dedup();
        if keys.len() != self.items.len() {
            return Err(DraftError::InvalidConfig("duplicate item keys".to_string()));
        }
        Ok(())
    }
}
