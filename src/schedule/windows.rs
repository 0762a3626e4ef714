//! Calendar window calculation - day-bounded active-hour intervals.
//!
//! The draft runs between two instants, but only time inside the daily
//! active-hours window counts toward pick deadlines. This module splits the
//! draft span into one window per calendar day, clipped on the first and last
//! day to the actual start/end instants.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::{DraftError, Result};

/// One day's usable slice of the draft span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityWindow {
    /// Usable duration; degenerate windows contribute zero.
    pub fn duration(&self) -> TimeDelta {
        (self.end - self.start).max(TimeDelta::zero())
    }

    /// A window whose clipped end does not lie after its start. Legal, but
    /// holds no draftable time.
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}

fn at(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    day.and_time(time).and_utc()
}

/// Split `[draft_start, draft_end]` into one window per calendar day.
///
/// Each day's nominal window is `[active_start, active_end]` on that day; the
/// first day starts no earlier than `draft_start` and the last day ends no
/// later than `draft_end`, with both boundary instants clamped into active
/// hours. Degenerate windows are kept so that window position stays aligned
/// with calendar days - the deadline allocator walks this sequence
/// positionally.
pub fn window_sequence(
    draft_start: DateTime<Utc>,
    draft_end: DateTime<Utc>,
    active_start: NaiveTime,
    active_end: NaiveTime,
) -> Result<Vec<AvailabilityWindow>> {
    if draft_start >= draft_end {
        return Err(DraftError::Schedule(format!(
            "draft end {draft_end} is not after draft start {draft_start}"
        )));
    }
    if active_start >= active_end {
        return Err(DraftError::InvalidConfig(format!(
            "active hours end {active_end} is not after start {active_start}"
        )));
    }

    let first_day = draft_start.date_naive();
    let last_day = draft_end.date_naive();

    // Clamp an instant into a day's active hours.
    let clamp = |day: NaiveDate, instant: DateTime<Utc>| {
        instant.max(at(day, active_start)).min(at(day, active_end))
    };

    let mut windows = Vec::new();
    if first_day == last_day {
        windows.push(AvailabilityWindow {
            start: clamp(first_day, draft_start),
            end: clamp(first_day, draft_end),
        });
    } else {
        windows.push(AvailabilityWindow {
            start: clamp(first_day, draft_start),
            end: at(first_day, active_end),
        });
        for day in first_day.iter_days().skip(1) {
            if day >= last_day {
                break;
            }
            windows.push(AvailabilityWindow {
                start: at(day, active_start),
                end: at(day, active_end),
            });
        }
        windows.push(AvailabilityWindow {
            start: at(last_day, active_start),
            end: clamp(last_day, draft_end),
        });
    }

    Ok(windows)
}

/// The instant after which the draft is over: the end instant clamped to the
/// final day's active hours.
pub fn effective_end(draft_end: DateTime<Utc>, active_end: NaiveTime) -> DateTime<Utc> {
    draft_end.min(at(draft_end.date_naive(), active_end))
}
