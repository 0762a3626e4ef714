//! Pick opportunity racing - fans the open choice surfaces into one event
//! funnel and retires them once the opportunity resolves.
//!
//! Every eligible participant (the current drafter plus everyone in the skip
//! set) gets a fresh surface per opportunity. Each surface resolves at most
//! once; a forwarder task moves its event into a single mpsc funnel that the
//! session races against the skip override, the deadline watcher, and the
//! session stop signal. Dropping the funnel receiver retires whatever events
//! lost the race: they are never observed again.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{Item, ParticipantHandle};
use crate::notify::{ChoiceEvent, Notifier, SurfaceId};

/// What won the race for one pick opportunity.
#[derive(Debug)]
pub(crate) enum RaceEvent {
    /// A surface produced a terminal event.
    Choice {
        from_seat: usize,
        event: ChoiceEvent,
    },
    /// The session skip override fired.
    SkipOverride,
    /// The deadline watcher completed.
    DeadlineReached,
    /// The session-wide stop signal fired.
    StopRequested,
}

struct OpenSurface {
    seat: usize,
    id: SurfaceId,
}

/// The choice side of one pick opportunity: open surfaces plus the funnel
/// their events converge into.
pub(crate) struct PickRace {
    notifier: Arc<dyn Notifier>,
    event_tx: mpsc::Sender<(usize, ChoiceEvent)>,
    event_rx: mpsc::Receiver<(usize, ChoiceEvent)>,
    open: Vec<OpenSurface>,
}

impl PickRace {
    pub(crate) fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(64);
        Self {
            notifier,
            event_tx,
            event_rx,
            open: Vec::new(),
        }
    }

    /// Present a fresh surface to `participant` and forward its terminal
    /// event into the funnel. Presentation failures are non-fatal: the
    /// opportunity can still resolve by skip or timeout.
    pub(crate) async fn open_surface(&mut self, participant: &ParticipantHandle, items: Vec<Item>) {
        match self.notifier.present_choices(participant, &items).await {
            Ok(surface) => {
                let seat = participant.seat;
                let tx = self.event_tx.clone();
                let receiver = surface.receiver;
                tokio::spawn(async move {
                    // An Err here means the surface was withdrawn unresolved
                    if let Ok(event) = receiver.await {
                        let _ = tx.send((seat, event)).await;
                    }
                });
                self.open.push(OpenSurface {
                    seat,
                    id: surface.id,
                });
            }
            Err(e) => warn!(
                participant = %participant.name,
                "failed to present choices: {e}"
            ),
        }
    }

    /// Withdraw `participant`'s current surface and present a fresh one with
    /// an updated option set; used after a stale choice.
    pub(crate) async fn reoffer(&mut self, participant: &ParticipantHandle, items: Vec<Item>) {
        if let Some(pos) = self.open.iter().position(|s| s.seat == participant.seat) {
            let stale = self.open.remove(pos);
            if let Err(e) = self.notifier.withdraw_choices(stale.id).await {
                warn!("failed to withdraw stale surface: {e}");
            }
        }
        self.open_surface(participant, items).await;
    }

    /// Next choice event out of the funnel. Cancel-safe.
    pub(crate) async fn next_event(&mut self) -> Option<(usize, ChoiceEvent)> {
        self.event_rx.recv().await
    }

    /// Retire every open surface. Pending events already in the funnel die
    /// with the race when it is dropped.
    pub(crate) async fn withdraw_all(&mut self) {
        for surface in self.open.drain(..) {
            debug!(seat = surface.seat, "withdrawing choice surface");
            if let Err(e) = self.notifier.withdraw_choices(surface.id).await {
                warn!("failed to withdraw surface: {e}");
            }
        }
    }

    /// Number of currently open surfaces.
    pub(crate) fn open_count(&self) -> usize {
        self.open.len()
    }
}
