//! Full draft integration tests
//!
//! Drives whole sessions through the mock notification surface: happy-path
//! snake drafts, timeouts with late out-of-turn picks, simultaneous choices,
//! stale re-offers, stops, and store-based resume.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use draftr::domain::{Item, SessionOutcome};
use draftr::error::Result;
use draftr::membership::{ChannelScope, StaticMembership};
use draftr::notify::{ChoiceEvent, MockNotifier, PresentedSurface};
use draftr::session::{DraftSession, SessionControl, SessionSetup};
use draftr::store::{MemoryPickStore, PickStore};

fn setup(participants: &[&str], num_picks: usize, num_items: usize) -> SessionSetup {
    SessionSetup {
        event_id: "2023test".to_string(),
        scope: ChannelScope::new("draft-channel"),
        participants: participants.iter().map(|s| s.to_string()).collect(),
        items: (1..=num_items)
            .map(|i| Item::new(i.to_string(), format!("Item {i}")))
            .collect(),
        draft_end: Utc::now() + TimeDelta::hours(4),
        num_picks,
        active_start: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        active_end: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        snap_interval_minutes: 0,
        reminder_offsets: vec![],
    }
}

struct Harness {
    notifier: Arc<MockNotifier>,
    presented_rx: mpsc::UnboundedReceiver<PresentedSurface>,
    control: SessionControl,
    session: Option<DraftSession>,
}

impl Harness {
    async fn create(setup: SessionSetup, store: Arc<MemoryPickStore>) -> Result<Self> {
        let membership = Arc::new(StaticMembership::from_names(&setup.participants));
        let (notifier, presented_rx) = MockNotifier::new();
        let notifier = Arc::new(notifier);
        let (session, control) = DraftSession::create(
            setup,
            Utc::now(),
            membership,
            Arc::clone(&store) as Arc<dyn PickStore>,
            Arc::clone(&notifier) as Arc<dyn draftr::notify::Notifier>,
        )
        .await?;
        Ok(Self {
            notifier,
            presented_rx,
            control,
            session: Some(session),
        })
    }

    fn spawn(&mut self) -> JoinHandle<Result<SessionOutcome>> {
        let session = self.session.take().expect("session already spawned");
        tokio::spawn(session.run())
    }

    /// Next presented surface, guarded against a hung session.
    async fn next_surface(&mut self) -> PresentedSurface {
        timeout(Duration::from_secs(5), self.presented_rx.recv())
            .await
            .expect("timed out waiting for a choice surface")
            .expect("notifier dropped")
    }

    /// Next surface presented to a specific participant, discarding others.
    async fn surface_for(&mut self, name: &str) -> PresentedSurface {
        loop {
            let surface = self.next_surface().await;
            if surface.participant == name {
                return surface;
            }
        }
    }
}

async fn finish(task: JoinHandle<Result<SessionOutcome>>) -> SessionOutcome {
    timeout(Duration::from_secs(5), task)
        .await
        .expect("session hung")
        .expect("session task panicked")
        .expect("session returned an error")
}

#[tokio::test]
async fn test_happy_path_snake_draft() {
    // 2 participants x 2 rounds: snake order is alice, bob, bob, alice
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 2, 4), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    for (name, pick) in [("alice", "1"), ("bob", "2"), ("bob", "3"), ("alice", "4")] {
        let surface = harness.surface_for(name).await;
        surface
            .reply
            .send(ChoiceEvent::Choice(pick.into()))
            .unwrap();
    }

    assert_eq!(finish(task).await, SessionOutcome::Completed);

    // Snake order: linear 0..4 -> (0,alice) (0,bob) (1,bob) (1,alice)
    assert_eq!(store.read_pick(0, 0).await.unwrap(), Some("1".into()));
    assert_eq!(store.read_pick(0, 1).await.unwrap(), Some("2".into()));
    assert_eq!(store.read_pick(1, 1).await.unwrap(), Some("3".into()));
    assert_eq!(store.read_pick(1, 0).await.unwrap(), Some("4".into()));
    assert_eq!(store.len(), 4);

    let sent = harness.notifier.sent_texts();
    assert!(sent.iter().any(|text| text.contains("Starting draft")));
    assert!(sent.iter().any(|text| text.contains("has finished")));
}

#[tokio::test]
async fn test_skip_then_out_of_turn_pick_lands_in_earliest_round() {
    // Alice is skipped; her late pick must land in her own round 0, not in
    // the round open at the time she finally acts.
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 2, 4), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    // Alice's opportunity opens; the override skips her
    let _alice_first = harness.surface_for("alice").await;
    harness.control.skip().await;

    // Bob's opportunity: bob (current) and alice (skip set) both get surfaces
    let bob_surface = harness.surface_for("bob").await;
    let alice_surface = harness.surface_for("alice").await;

    // Alice acts out of turn: recorded at (round 0, alice), and bob's
    // opportunity reopens with the same deadline
    alice_surface
        .reply
        .send(ChoiceEvent::Choice("1".into()))
        .unwrap();
    drop(bob_surface);

    // Only bob is re-presented now; he drafts through rounds 0 and 1
    let bob_again = harness.surface_for("bob").await;
    bob_again
        .reply
        .send(ChoiceEvent::Choice("2".into()))
        .unwrap();
    let bob_round_two = harness.surface_for("bob").await;
    bob_round_two
        .reply
        .send(ChoiceEvent::Choice("3".into()))
        .unwrap();
    let alice_round_two = harness.surface_for("alice").await;
    alice_round_two
        .reply
        .send(ChoiceEvent::Choice("4".into()))
        .unwrap();

    assert_eq!(finish(task).await, SessionOutcome::Completed);

    assert_eq!(store.read_pick(0, 0).await.unwrap(), Some("1".into()));
    assert_eq!(store.read_pick(0, 1).await.unwrap(), Some("2".into()));
    assert_eq!(store.read_pick(1, 1).await.unwrap(), Some("3".into()));
    assert_eq!(store.read_pick(1, 0).await.unwrap(), Some("4".into()));
}

#[tokio::test]
async fn test_timeout_adds_to_skip_set_and_late_pick_recovers() {
    // The first deadline passes with no answer: alice times out, bob becomes
    // current, and alice remains eligible to pick late into round 0.
    let mut s = setup(&["alice", "bob"], 1, 2);
    s.draft_end = Utc::now() + TimeDelta::milliseconds(1600);
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(s, Arc::clone(&store)).await.unwrap();
    let task = harness.spawn();

    // Alice's surface appears but she never answers; the deadline fires
    let _alice_first = harness.surface_for("alice").await;

    // Bob's opportunity presents to bob and to the skipped alice
    let bob_surface = harness.surface_for("bob").await;
    let alice_surface = harness.surface_for("alice").await;

    // Alice's late pick lands in her own round 0 slot
    alice_surface
        .reply
        .send(ChoiceEvent::Choice("1".into()))
        .unwrap();
    drop(bob_surface);

    // Bob's reopened surface finishes the draft
    let bob_again = harness.surface_for("bob").await;
    bob_again
        .reply
        .send(ChoiceEvent::Choice("2".into()))
        .unwrap();

    assert_eq!(finish(task).await, SessionOutcome::Completed);
    assert_eq!(store.read_pick(0, 0).await.unwrap(), Some("1".into()));
    assert_eq!(store.read_pick(0, 1).await.unwrap(), Some("2".into()));

    let sent = harness.notifier.sent_texts();
    assert!(sent.iter().any(|text| text.contains("Time is up")));
}

#[tokio::test]
async fn test_simultaneous_choices_resolve_exactly_once() {
    // Two surfaces both answer the same item before the session reads
    // either. Exactly one is honored; the other event dies with the retired
    // funnel and is never recorded.
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 1, 3), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    // Skip alice so bob's opportunity carries two live surfaces
    let _alice_first = harness.surface_for("alice").await;
    harness.control.skip().await;

    let bob_surface = harness.surface_for("bob").await;
    let alice_surface = harness.surface_for("alice").await;

    let _ = alice_surface.reply.send(ChoiceEvent::Choice("1".into()));
    let _ = bob_surface.reply.send(ChoiceEvent::Choice("1".into()));

    // Whoever lost may be re-presented (with item 1 gone); answer any
    // reopened surface with its first offered item until the session ends.
    let mut task = task;
    let outcome = loop {
        tokio::select! {
            result = &mut task => break result.unwrap().unwrap(),
            Some(surface) = harness.presented_rx.recv() => {
                assert!(
                    surface.items.iter().all(|item| item.key.as_str() != "1"),
                    "re-presented options must not include the taken item"
                );
                if let Some(item) = surface.items.first() {
                    let _ = surface.reply.send(ChoiceEvent::Choice(item.key.clone()));
                }
            }
        }
    };
    assert_eq!(outcome, SessionOutcome::Completed);

    // Item 1 was recorded exactly once, whichever event won the race
    let alice_pick = store.read_pick(0, 0).await.unwrap();
    let bob_pick = store.read_pick(0, 1).await.unwrap();
    let ones = [&alice_pick, &bob_pick]
        .iter()
        .filter(|pick| pick.as_ref().map(|key| key.as_str()) == Some("1"))
        .count();
    assert_eq!(ones, 1);
}

#[tokio::test]
async fn test_stale_choice_is_reoffered_without_advancing() {
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 1, 3), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    // Alice picks an item that is not in the pool (stale option set)
    let alice_surface = harness.surface_for("alice").await;
    alice_surface
        .reply
        .send(ChoiceEvent::Choice("999".into()))
        .unwrap();

    // The stale choice is discarded and alice is re-offered; the cursor has
    // not moved and nothing was persisted
    let alice_again = harness.surface_for("alice").await;
    assert_eq!(store.len(), 0);
    alice_again
        .reply
        .send(ChoiceEvent::Choice("1".into()))
        .unwrap();

    let bob_surface = harness.surface_for("bob").await;
    bob_surface
        .reply
        .send(ChoiceEvent::Choice("2".into()))
        .unwrap();

    assert_eq!(finish(task).await, SessionOutcome::Completed);
    assert_eq!(store.read_pick(0, 0).await.unwrap(), Some("1".into()));

    let sent = harness.notifier.sent_texts();
    assert!(sent.iter().any(|text| text.contains("already taken")));
}

#[tokio::test]
async fn test_stop_mid_opportunity_terminates_session() {
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 2, 4), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    // An opportunity is open, then the stop fires
    let _alice_surface = harness.surface_for("alice").await;
    harness.control.stop();

    assert_eq!(finish(task).await, SessionOutcome::Stopped);

    // No picks were persisted, and the displayed messages were cleaned up
    assert_eq!(store.len(), 0);
    assert!(!harness.notifier.deleted_messages().is_empty());
}

#[tokio::test]
async fn test_resume_from_store_shrinks_pool_and_deadlines() {
    // A prior run made the first two picks; the session resumes after them.
    let store = Arc::new(MemoryPickStore::new());
    store.seed(0, 0, "1".into());
    store.seed(0, 1, "2".into());

    let mut harness = Harness::create(setup(&["alice", "bob"], 2, 4), Arc::clone(&store))
        .await
        .unwrap();
    {
        let session = harness.session.as_ref().unwrap();
        assert_eq!(session.board().picks_made(), 2);
        assert_eq!(session.pool().remaining_count(), 2);
        assert_eq!(session.deadlines().len(), 2);
    }
    let task = harness.spawn();

    // Round 1 runs in reverse: bob first, then alice
    let bob_surface = harness.surface_for("bob").await;
    bob_surface
        .reply
        .send(ChoiceEvent::Choice("3".into()))
        .unwrap();
    let alice_surface = harness.surface_for("alice").await;
    alice_surface
        .reply
        .send(ChoiceEvent::Choice("4".into()))
        .unwrap();

    assert_eq!(finish(task).await, SessionOutcome::Completed);
    assert_eq!(store.len(), 4);
    assert_eq!(store.read_pick(1, 1).await.unwrap(), Some("3".into()));
    assert_eq!(store.read_pick(1, 0).await.unwrap(), Some("4".into()));
}

#[tokio::test]
async fn test_surface_skip_request_defers_current_drafter() {
    // A skip request arriving through a choice surface behaves like the
    // override: the current drafter joins the skip set.
    let store = Arc::new(MemoryPickStore::new());
    let mut harness = Harness::create(setup(&["alice", "bob"], 1, 2), Arc::clone(&store))
        .await
        .unwrap();
    let task = harness.spawn();

    let alice_surface = harness.surface_for("alice").await;
    alice_surface.reply.send(ChoiceEvent::SkipRequest).unwrap();

    // Bob is current now; alice still gets a surface as a skip-set member
    let bob_surface = harness.surface_for("bob").await;
    let alice_again = harness.surface_for("alice").await;
    bob_surface
        .reply
        .send(ChoiceEvent::Choice("2".into()))
        .unwrap();
    drop(alice_again);

    assert_eq!(finish(task).await, SessionOutcome::Completed);

    // Alice never picked: the draft ends with her slot unset
    assert_eq!(store.len(), 1);
    assert_eq!(store.read_pick(0, 1).await.unwrap(), Some("2".into()));
    assert!(store.read_pick(0, 0).await.unwrap().is_none());
}
