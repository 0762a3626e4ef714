//! Participants and their per-round pick slots.

use serde::{Deserialize, Serialize};

use super::item::ItemKey;
use crate::error::{DraftError, Result};

/// A resolved draft participant.
///
/// `seat` is the participant's position in round zero; the snake order
/// derives every later turn from it. `member` is the opaque identity the
/// membership resolver returned for the configured display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantHandle {
    pub name: String,
    pub member: String,
    pub seat: usize,
}

impl ParticipantHandle {
    pub fn new(name: impl Into<String>, member: impl Into<String>, seat: usize) -> Self {
        Self {
            name: name.into(),
            member: member.into(),
            seat,
        }
    }
}

/// Per-participant ordered pick slots.
///
/// Invariant: a slot is set at most once and, once set, never cleared.
#[derive(Debug, Clone)]
pub struct PickBoard {
    participants: Vec<ParticipantHandle>,
    num_picks: usize,
    /// Indexed [seat][round]
    slots: Vec<Vec<Option<ItemKey>>>,
}

impl PickBoard {
    pub fn new(participants: Vec<ParticipantHandle>, num_picks: usize) -> Self {
        let slots = participants.iter().map(|_| vec![None; num_picks]).collect();
        Self {
            participants,
            num_picks,
            slots,
        }
    }

    pub fn num_participants(&self) -> usize {
        self.participants.len()
    }

    pub fn num_picks(&self) -> usize {
        self.num_picks
    }

    /// Total pick slots across all participants and rounds.
    pub fn total_picks(&self) -> usize {
        self.num_picks * self.participants.len()
    }

    pub fn participants(&self) -> &[ParticipantHandle] {
        &self.participants
    }

    pub fn participant(&self, seat: usize) -> &ParticipantHandle {
        &self.participants[seat]
    }

    /// Seat index for a display name, if the name is on the board.
    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.name == name)
    }

    pub fn get(&self, round: usize, seat: usize) -> Option<&ItemKey> {
        self.slots.get(seat)?.get(round)?.as_ref()
    }

    pub fn is_set(&self, round: usize, seat: usize) -> bool {
        self.get(round, seat).is_some()
    }

    /// First round this seat has not yet filled, scanning from round zero.
    pub fn earliest_unset_round(&self, seat: usize) -> Option<usize> {
        self.slots.get(seat)?.iter().position(|slot| slot.is_none())
    }

    /// Record a pick. Rejects a second write to the same slot.
    pub fn record(&mut self, round: usize, seat: usize, item: ItemKey) -> Result<()> {
        let slot = self
            .slots
            .get_mut(seat)
            .and_then(|rounds| rounds.get_mut(round))
            .ok_or_else(|| {
                DraftError::InvalidConfig(format!("no slot at round {round}, seat {seat}"))
            })?;
        if slot.is_some() {
            return Err(DraftError::SlotTaken { round, seat });
        }
        *slot = Some(item);
        Ok(())
    }

    /// Count of filled slots.
    pub fn picks_made(&self) -> usize {
        self.slots
            .iter()
            .flat_map(|rounds| rounds.iter())
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.picks_made() == self.total_picks()
    }
}
