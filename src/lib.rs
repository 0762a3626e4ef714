//! Draftr - a snake-order draft scheduler
//!
//! Draftr runs turn-based drafts against a hard wall-clock deadline: pick
//! time budgets are allocated across daily active-hour windows, and each pick
//! races a human choice against a skip override, an automatic timeout, and a
//! session-wide stop.

pub mod config;
pub mod domain;
pub mod error;
pub mod membership;
pub mod notify;
pub mod schedule;
pub mod session;
pub mod store;

pub use error::{DraftError, Result};
