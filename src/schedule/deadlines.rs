//! Deadline allocation - spreads the remaining picks evenly across the
//! availability windows, then snaps each deadline to a readable interval.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use super::windows::AvailabilityWindow;
use crate::error::{DraftError, Result};

/// Compute one deadline per remaining pick.
///
/// The total usable duration is divided by `picks_left` as an exact ratio so
/// error does not compound across picks; the window walk tolerates one second
/// of drift from the division before moving to the next day. Deadlines are
/// non-decreasing and the last lands at the final non-degenerate window's end
/// (before snapping).
pub fn allocate(
    windows: &[AvailabilityWindow],
    picks_already_made: usize,
    total_picks: usize,
    snap_interval_minutes: u32,
) -> Result<Vec<DateTime<Utc>>> {
    if total_picks <= picks_already_made {
        return Err(DraftError::Schedule(format!(
            "nothing to allocate: {picks_already_made} of {total_picks} picks already made"
        )));
    }
    if windows.is_empty() {
        return Err(DraftError::Schedule("no availability windows".to_string()));
    }

    let picks_left = total_picks - picks_already_made;
    let total = windows
        .iter()
        .fold(TimeDelta::zero(), |acc, w| acc + w.duration());
    let per_pick = total / picks_left as i32;
    let slack = TimeDelta::seconds(1);

    let mut deadlines = Vec::with_capacity(picks_left);
    let mut window_idx = 0usize;
    let mut consumed = TimeDelta::zero();

    for pick in 1..=picks_left as i32 {
        let target = per_pick * pick;
        while window_idx + 1 < windows.len()
            && consumed + windows[window_idx].duration() < target - slack
        {
            consumed += windows[window_idx].duration();
            window_idx += 1;
        }
        let deadline = windows[window_idx].start + (target - consumed);
        deadlines.push(snap(deadline, snap_interval_minutes));
    }

    Ok(deadlines)
}

/// Snap an instant to the nearest multiple of `interval_minutes` from the top
/// of the hour; a remainder of at least half the interval rounds up.
/// Idempotent: snapping a snapped instant returns it unchanged. An interval
/// of zero disables snapping.
pub fn snap(instant: DateTime<Utc>, interval_minutes: u32) -> DateTime<Utc> {
    if interval_minutes == 0 {
        return instant;
    }
    let interval = TimeDelta::minutes(interval_minutes as i64);
    let over = TimeDelta::minutes((instant.minute() % interval_minutes) as i64)
        + TimeDelta::seconds(instant.second() as i64)
        + TimeDelta::nanoseconds(instant.nanosecond() as i64);
    let mut snapped = instant - over;
    if over * 2 >= interval {
        snapped += interval;
    }
    snapped
}
