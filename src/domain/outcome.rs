//! Resolution outcomes for pick opportunities and sessions.

use super::item::ItemKey;

/// How a single pick opportunity ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The nominal current drafter picked; the cursor advances.
    PickedInTurn {
        seat: usize,
        round: usize,
        item: ItemKey,
    },
    /// A previously skipped drafter picked into their own earliest unset
    /// round; the current opportunity reopens with the same deadline.
    PickedOutOfTurn {
        seat: usize,
        round: usize,
        item: ItemKey,
    },
    /// The current drafter was skipped and remains eligible out of turn.
    Skipped,
    /// The deadline passed; treated like a skip.
    TimedOut,
    /// The session-wide stop signal fired.
    Stopped,
}

impl PickOutcome {
    /// Whether the session cursor moves past the current linear index.
    pub fn advances_cursor(&self) -> bool {
        matches!(
            self,
            PickOutcome::PickedInTurn { .. } | PickOutcome::Skipped | PickOutcome::TimedOut
        )
    }
}

/// How a whole draft session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The cursor passed the final linear pick index.
    Completed,
    /// A stop was requested before the draft finished.
    Stopped,
}
