//! Draft session - owns the shared pool and the pick board, and drives the
//! pick resolution state machine until the draft completes or is stopped.
//!
//! Within a session exactly one fresh pick opportunity is open at a time.
//! Skipped participants stay eligible across later opportunities: each new
//! opportunity re-presents a surface to every skip-set member alongside the
//! current drafter, and an out-of-turn pick lands in the picker's own
//! earliest unset round without advancing the cursor.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::{
    Item, ItemPool, ParticipantHandle, PickBoard, PickOutcome, SessionOutcome,
};
use crate::error::{DraftError, Result};
use crate::membership::{ChannelScope, MembershipResolver};
use crate::notify::{ChoiceEvent, MessageHandle, Notifier};
use crate::schedule::{self, windows};
use crate::session::pick::{PickRace, RaceEvent};
use crate::session::registry::{SessionControl, SessionProgress};
use crate::session::watch::watch_deadline;
use crate::store::PickStore;

const DATE_FMT: &str = "%a. %b %d %I:%M%p";
const CELL_WIDTH: usize = 21;

/// Everything needed to create a session, already resolved to concrete
/// types; the config layer builds this from the config file plus an event
/// spec.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    pub event_id: String,
    pub scope: ChannelScope,
    /// Display names in seat order (round-zero pick order).
    pub participants: Vec<String>,
    pub items: Vec<Item>,
    pub draft_end: DateTime<Utc>,
    pub num_picks: usize,
    pub active_start: NaiveTime,
    pub active_end: NaiveTime,
    pub snap_interval_minutes: u32,
    pub reminder_offsets: Vec<TimeDelta>,
}

/// One running draft. Created with [`DraftSession::create`], consumed by
/// [`DraftSession::run`].
pub struct DraftSession {
    event_id: String,
    board: PickBoard,
    pool: ItemPool,
    skip_set: BTreeSet<usize>,
    /// Deadline per linear pick index, for picks unset at session start.
    deadline_at: HashMap<usize, DateTime<Utc>>,
    draft_start: DateTime<Utc>,
    draft_end: DateTime<Utc>,
    time_per_pick: Option<TimeDelta>,
    reminder_offsets: Vec<TimeDelta>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn PickStore>,
    stop_rx: watch::Receiver<bool>,
    skip_rx: Option<mpsc::Receiver<()>>,
    progress: Arc<Mutex<SessionProgress>>,
    /// Status messages still on screen, deleted on stop.
    tracked: Vec<MessageHandle>,
    board_msg: Option<MessageHandle>,
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("event_id", &self.event_id)
            .field("draft_start", &self.draft_start)
            .field("draft_end", &self.draft_end)
            .finish_non_exhaustive()
    }
}

impl DraftSession {
    /// Validate the setup, resolve membership, recover prior picks from the
    /// store, and compute the full deadline schedule from `now`.
    ///
    /// Nothing is announced and nothing mutates externally until
    /// [`DraftSession::run`]; a failure here leaves no trace.
    pub async fn create(
        setup: SessionSetup,
        now: DateTime<Utc>,
        membership: Arc<dyn MembershipResolver>,
        store: Arc<dyn PickStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(Self, SessionControl)> {
        if setup.participants.is_empty() {
            return Err(DraftError::InvalidConfig(
                "no participants configured".to_string(),
            ));
        }
        if setup.num_picks == 0 {
            return Err(DraftError::InvalidConfig(
                "num_picks must be at least 1".to_string(),
            ));
        }
        if setup.items.len() < setup.num_picks * setup.participants.len() {
            return Err(DraftError::InvalidConfig(format!(
                "{} items cannot fill {} pick slots",
                setup.items.len(),
                setup.num_picks * setup.participants.len()
            )));
        }

        // A draft cannot be started after its own deadline
        let end = windows::effective_end(setup.draft_end, setup.active_end);
        if now > end {
            return Err(DraftError::Schedule(format!(
                "deadline for {} has passed ({})",
                setup.event_id,
                end.format(DATE_FMT)
            )));
        }

        let mut participants = Vec::with_capacity(setup.participants.len());
        for (seat, name) in setup.participants.iter().enumerate() {
            match membership.find_participant(&setup.scope, name).await? {
                Some(member) => participants.push(ParticipantHandle::new(name, member, seat)),
                None => return Err(DraftError::ParticipantNotFound(name.clone())),
            }
        }

        let mut board = PickBoard::new(participants, setup.num_picks);
        let mut pool = ItemPool::new(setup.items);

        // Recover picks a previous run already made
        for linear in 0..board.total_picks() {
            let (round, seat) = schedule::slot_at(linear, board.num_participants());
            if let Some(key) = store.read_pick(round, seat).await? {
                if !pool.take(&key) {
                    warn!(item = %key, "stored pick is not in the item catalog");
                }
                board.record(round, seat, key)?;
            }
        }
        let picks_made = board.picks_made();
        info!(
            event_id = %setup.event_id,
            picks_made,
            "recovered prior picks from store"
        );

        // Windows and deadlines are computed exactly once, from session
        // start; prior picks only shrink the count being allocated.
        let mut deadline_at = HashMap::new();
        let mut time_per_pick = None;
        if picks_made < board.total_picks() {
            let window_seq = schedule::window_sequence(
                now,
                setup.draft_end,
                setup.active_start,
                setup.active_end,
            )?;
            let deadlines = schedule::allocate(
                &window_seq,
                picks_made,
                board.total_picks(),
                setup.snap_interval_minutes,
            )?;

            let total = window_seq
                .iter()
                .fold(TimeDelta::zero(), |acc, w| acc + w.duration());
            time_per_pick = Some(total / (board.total_picks() - picks_made) as i32);

            let mut next = 0usize;
            for linear in 0..board.total_picks() {
                let (round, seat) = schedule::slot_at(linear, board.num_participants());
                if !board.is_set(round, seat) {
                    deadline_at.insert(linear, deadlines[next]);
                    next += 1;
                }
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (skip_tx, skip_rx) = mpsc::channel(8);
        let first_drafter = board.participant(0).name.clone();
        let progress = Arc::new(Mutex::new(SessionProgress {
            round: 0,
            drafter: first_drafter,
            picks_made,
        }));
        let control = SessionControl::new(stop_tx, skip_tx, Arc::clone(&progress));

        let session = Self {
            event_id: setup.event_id,
            board,
            pool,
            skip_set: BTreeSet::new(),
            deadline_at,
            draft_start: now,
            draft_end: setup.draft_end,
            time_per_pick,
            reminder_offsets: setup.reminder_offsets,
            notifier,
            store,
            stop_rx,
            skip_rx: Some(skip_rx),
            progress,
            tracked: Vec::new(),
            board_msg: None,
        };
        Ok((session, control))
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn board(&self) -> &PickBoard {
        &self.board
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    /// Deadlines for the picks that were unset at session start, in linear
    /// pick order.
    pub fn deadlines(&self) -> Vec<(usize, DateTime<Utc>)> {
        let mut entries: Vec<_> = self
            .deadline_at
            .iter()
            .map(|(linear, deadline)| (*linear, *deadline))
            .collect();
        entries.sort_by_key(|(linear, _)| *linear);
        entries
    }

    /// Drive the draft to completion or stop. Consumes the session.
    pub async fn run(mut self) -> Result<SessionOutcome> {
        let mut stop_rx = self.stop_rx.clone();
        let mut skip_rx = self
            .skip_rx
            .take()
            .ok_or_else(|| DraftError::InvalidConfig("session already ran".to_string()))?;

        info!(event_id = %self.event_id, "starting draft");
        self.try_send(&format!("Starting draft for event **{}**", self.event_id))
            .await;
        self.announce_schedule().await;
        let board_text = self.render_board();
        self.board_msg = self.try_send(&board_text).await;
        let item_list = self.render_item_list();
        self.try_send(&item_list).await;

        let total = self.board.total_picks();
        let participants = self.board.num_participants();
        let mut pick_idx = 0usize;

        while pick_idx < total {
            if *stop_rx.borrow() {
                return self.shutdown().await;
            }
            let (round, seat) = schedule::slot_at(pick_idx, participants);
            if self.board.is_set(round, seat) {
                // Defensive re-check; set slots consume no deadline
                pick_idx += 1;
                continue;
            }
            let deadline = self.deadline_at.get(&pick_idx).copied().ok_or_else(|| {
                DraftError::Schedule(format!("no deadline allocated for pick {pick_idx}"))
            })?;

            self.update_progress(round, seat);
            let outcome = self
                .run_opportunity(&mut stop_rx, &mut skip_rx, pick_idx, deadline)
                .await?;

            match &outcome {
                PickOutcome::Stopped => {
                    return self.shutdown().await;
                }
                PickOutcome::Skipped | PickOutcome::TimedOut => {
                    self.skip_set.insert(seat);
                }
                PickOutcome::PickedInTurn { .. } | PickOutcome::PickedOutOfTurn { .. } => {}
            }
            if outcome.advances_cursor() {
                pick_idx += 1;
            }
        }

        info!(event_id = %self.event_id, "draft finished");
        self.try_send(&format!(
            "Draft for **{}** has finished! All picks are recorded.",
            self.event_id
        ))
        .await;
        Ok(SessionOutcome::Completed)
    }

    /// One pick opportunity: present surfaces to everyone eligible, race the
    /// events, apply exactly one resolution.
    async fn run_opportunity(
        &mut self,
        stop_rx: &mut watch::Receiver<bool>,
        skip_rx: &mut mpsc::Receiver<()>,
        pick_idx: usize,
        deadline: DateTime<Utc>,
    ) -> Result<PickOutcome> {
        let participants = self.board.num_participants();
        let (round, seat) = schedule::slot_at(pick_idx, participants);
        let drafter = self.board.participant(seat).clone();

        // Skip presses that landed between opportunities are stale
        while skip_rx.try_recv().is_ok() {}

        debug!(
            event_id = %self.event_id,
            pick_idx,
            round,
            drafter = %drafter.name,
            %deadline,
            "opening pick opportunity"
        );
        let turn_msg = self
            .try_send(&format!(
                "Current drafter is {}, deadline is **{}**",
                drafter.name,
                deadline.format(DATE_FMT)
            ))
            .await;

        let mut race = PickRace::new(Arc::clone(&self.notifier));
        race.open_surface(&drafter, self.pool.remaining_items()).await;
        for &skipped in &self.skip_set {
            let eligible = self.board.participant(skipped).clone();
            race.open_surface(&eligible, self.pool.remaining_items()).await;
        }

        let reminders: Arc<Mutex<Vec<MessageHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let watcher = watch_deadline(
            Arc::clone(&self.notifier),
            self.event_id.clone(),
            drafter.clone(),
            deadline,
            self.reminder_offsets.clone(),
            Arc::clone(&reminders),
        );
        tokio::pin!(watcher);

        let outcome = loop {
            let event = tokio::select! {
                Ok(()) = stop_rx.changed() => RaceEvent::StopRequested,
                Some(()) = skip_rx.recv() => RaceEvent::SkipOverride,
                () = &mut watcher => RaceEvent::DeadlineReached,
                Some((from_seat, event)) = race.next_event() => {
                    RaceEvent::Choice { from_seat, event }
                }
            };

            match event {
                RaceEvent::StopRequested => break PickOutcome::Stopped,
                RaceEvent::SkipOverride => break PickOutcome::Skipped,
                RaceEvent::DeadlineReached => break PickOutcome::TimedOut,
                RaceEvent::Choice {
                    from_seat,
                    event: ChoiceEvent::SkipRequest,
                } => {
                    debug!(from_seat, "skip requested from a choice surface");
                    break PickOutcome::Skipped;
                }
                RaceEvent::Choice {
                    from_seat,
                    event: ChoiceEvent::Choice(key),
                } => {
                    if !self.pool.is_available(&key) {
                        // Stale: the surface's option set predates another
                        // resolution. Discard and re-offer with fresh options.
                        let picker = self.board.participant(from_seat).clone();
                        debug!(picker = %picker.name, item = %key, "stale choice discarded");
                        self.try_send(&format!(
                            "{} is already taken; pick again, {}",
                            key, picker.name
                        ))
                        .await;
                        race.reoffer(&picker, self.pool.remaining_items()).await;
                        continue;
                    }
                    let Some(pick_round) = self.board.earliest_unset_round(from_seat) else {
                        debug!(from_seat, "choice from a participant with no open slot");
                        continue;
                    };

                    // Persist before mutating: the store is the source of
                    // truth and must hold the pick before the cursor moves.
                    self.store.write_pick(pick_round, from_seat, &key).await?;
                    self.pool.take(&key);
                    self.board.record(pick_round, from_seat, key.clone())?;
                    self.skip_set.remove(&from_seat);

                    if from_seat == seat && pick_round == round {
                        break PickOutcome::PickedInTurn {
                            seat: from_seat,
                            round: pick_round,
                            item: key,
                        };
                    }
                    break PickOutcome::PickedOutOfTurn {
                        seat: from_seat,
                        round: pick_round,
                        item: key,
                    };
                }
            }
        };

        // Retire everything the race left behind: losing surfaces, the
        // deadline watcher (dropped with this scope), reminder messages.
        race.withdraw_all().await;
        self.delete_reminders(&reminders).await;
        self.announce_outcome(&outcome, turn_msg, &drafter, round).await;

        Ok(outcome)
    }

    /// Post-resolution status messages, mirroring what resolution happened.
    async fn announce_outcome(
        &mut self,
        outcome: &PickOutcome,
        turn_msg: Option<MessageHandle>,
        drafter: &ParticipantHandle,
        round: usize,
    ) {
        match outcome {
            PickOutcome::PickedInTurn { item, round, .. } => {
                if let Some(handle) = turn_msg {
                    self.try_edit(
                        handle,
                        &format!(
                            "{} picked {} for their #{} pick",
                            drafter.name,
                            item,
                            round + 1
                        ),
                    )
                    .await;
                }
                self.refresh_board_message().await;
            }
            PickOutcome::PickedOutOfTurn { seat, item, round } => {
                // Delete the current drafter's prompt so the reopened
                // opportunity pings them again without a duplicate.
                if let Some(handle) = turn_msg {
                    self.try_delete(handle).await;
                }
                let picker = self.board.participant(*seat).name.clone();
                self.try_send(&format!(
                    "{} picked {} for their #{} pick",
                    picker,
                    item,
                    round + 1
                ))
                .await;
                self.refresh_board_message().await;
            }
            PickOutcome::Skipped => {
                if let Some(handle) = turn_msg {
                    self.try_edit(
                        handle,
                        &format!(
                            "{}'s #{} pick was skipped but they may still pick",
                            drafter.name,
                            round + 1
                        ),
                    )
                    .await;
                }
            }
            PickOutcome::TimedOut => {
                self.try_send(&format!(
                    "Time is up, {}! Allowing the next drafter to pick",
                    drafter.name
                ))
                .await;
                if let Some(handle) = turn_msg {
                    self.try_edit(
                        handle,
                        &format!(
                            "{}'s #{} pick was skipped but they may still pick",
                            drafter.name,
                            round + 1
                        ),
                    )
                    .await;
                }
            }
            PickOutcome::Stopped => {}
        }
    }

    /// Terminal stop path: best-effort cleanup of everything on screen.
    async fn shutdown(mut self) -> Result<SessionOutcome> {
        info!(event_id = %self.event_id, "stopping draft");
        for handle in std::mem::take(&mut self.tracked) {
            if let Err(e) = self.notifier.delete_message(handle).await {
                warn!("failed to delete message during shutdown: {e}");
            }
        }
        Ok(SessionOutcome::Stopped)
    }

    fn update_progress(&self, round: usize, seat: usize) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.round = round;
            progress.drafter = self.board.participant(seat).name.clone();
            progress.picks_made = self.board.picks_made();
        }
    }

    async fn announce_schedule(&mut self) {
        let mut text = format!(
            "Draft Start Time: {}\nDraft End Time: {}",
            self.draft_start.format(DATE_FMT),
            self.draft_end.format(DATE_FMT)
        );
        if let Some(per_pick) = self.time_per_pick {
            text.push_str(&format!(
                "\nMinimum Time Limit per Pick: {}",
                format_duration(per_pick)
            ));
        }
        self.try_send(&text).await;
    }

    /// Monospace pick table: one row per participant, one column per round;
    /// unmade picks show their deadline, made picks their item key.
    pub fn render_board(&self) -> String {
        let participants = self.board.num_participants();
        let name_width = self
            .board
            .participants()
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(4)
            .max(4);

        let mut header = format!("{:^width$}", "Name", width = name_width + 1);
        for round in 0..self.board.num_picks() {
            header.push_str(&format!(
                "|{:^width$}",
                format!("Round {}", round + 1),
                width = CELL_WIDTH
            ));
        }
        let mut out = format!("```\n{header}\n{}\n", "-".repeat(header.len()));

        for seat in 0..participants {
            let name = &self.board.participant(seat).name;
            out.push_str(&format!("{name:>name_width$} "));
            for round in 0..self.board.num_picks() {
                let cell = match self.board.get(round, seat) {
                    Some(item) => format!("{:^width$}", item.to_string(), width = CELL_WIDTH),
                    None => {
                        let linear = schedule::linear_index(round, seat, participants);
                        match self.deadline_at.get(&linear) {
                            Some(deadline) => format!(" {} ", deadline.format(DATE_FMT)),
                            None => format!("{:^width$}", "-", width = CELL_WIDTH),
                        }
                    }
                };
                out.push('|');
                out.push_str(&cell);
            }
            out.push('\n');
        }
        out.push_str("```");
        out
    }

    fn render_item_list(&self) -> String {
        let mut out = String::from("Event Item List:\n");
        for item in self.pool.catalog() {
            out.push_str(&format!("{:<6} - {}\n", item.key, item.label));
        }
        out
    }

    async fn refresh_board_message(&mut self) {
        let text = self.render_board();
        match self.board_msg {
            Some(handle) => self.try_edit(handle, &text).await,
            None => self.board_msg = self.try_send(&text).await,
        }
    }

    // Notification failures never affect scheduling state: log and move on.

    async fn try_send(&mut self, text: &str) -> Option<MessageHandle> {
        match self.notifier.send_text(text).await {
            Ok(handle) => {
                self.tracked.push(handle);
                Some(handle)
            }
            Err(e) => {
                warn!("failed to send status message: {e}");
                None
            }
        }
    }

    async fn try_edit(&self, handle: MessageHandle, text: &str) {
        if let Err(e) = self.notifier.edit_text(handle, text).await {
            warn!("failed to edit status message: {e}");
        }
    }

    async fn try_delete(&mut self, handle: MessageHandle) {
        self.tracked.retain(|tracked| *tracked != handle);
        if let Err(e) = self.notifier.delete_message(handle).await {
            warn!("failed to delete status message: {e}");
        }
    }

    async fn delete_reminders(&mut self, reminders: &Arc<Mutex<Vec<MessageHandle>>>) {
        let handles = reminders
            .lock()
            .map(|mut sent| std::mem::take(&mut *sent))
            .unwrap_or_default();
        for handle in handles {
            if let Err(e) = self.notifier.delete_message(handle).await {
                warn!("failed to delete reminder message: {e}");
            }
        }
    }
}

/// `1d 2hr 03min` style rendering for per-pick budgets.
fn format_duration(delta: TimeDelta) -> String {
    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;
    if days > 0 {
        format!("{days}d {hours}hr {minutes:02}min")
    } else {
        format!("{hours}hr {minutes:02}min")
    }
}
