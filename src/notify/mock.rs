//! Mock notifier for tests: records every call and hands presented surfaces
//! to the test through a channel so it can answer (or ignore) them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{ChoiceEvent, ChoiceSurface, MessageHandle, Notifier, SurfaceId};
use crate::domain::{Item, ParticipantHandle};
use crate::error::Result;

/// A surface the session has opened, delivered to the test side.
#[derive(Debug)]
pub struct PresentedSurface {
    pub id: SurfaceId,
    pub participant: String,
    pub items: Vec<Item>,
    /// Send at most one event here to act as the participant.
    pub reply: oneshot::Sender<ChoiceEvent>,
}

/// Test double for the notification surface.
///
/// Sent texts, edits, and deletions are recorded for assertions; calls never
/// fail. Presented surfaces are forwarded on an unbounded channel.
pub struct MockNotifier {
    next_id: AtomicU64,
    presented_tx: mpsc::UnboundedSender<PresentedSurface>,
    sent: Mutex<Vec<(MessageHandle, String)>>,
    edits: Mutex<Vec<(MessageHandle, String)>>,
    deleted: Mutex<Vec<MessageHandle>>,
    withdrawn: Mutex<Vec<SurfaceId>>,
}

impl MockNotifier {
    /// Create the notifier plus the test-side receiver of presented surfaces.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentedSurface>) {
        let (presented_tx, presented_rx) = mpsc::unbounded_channel();
        let notifier = Self {
            next_id: AtomicU64::new(1),
            presented_tx,
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            withdrawn: Mutex::new(Vec::new()),
        };
        (notifier, presented_rx)
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// All texts sent so far.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|(_, text)| text.clone()).collect())
            .unwrap_or_default()
    }

    /// All edits applied so far.
    pub fn edited_texts(&self) -> Vec<String> {
        self.edits
            .lock()
            .map(|edits| edits.iter().map(|(_, text)| text.clone()).collect())
            .unwrap_or_default()
    }

    /// Handles of deleted messages.
    pub fn deleted_messages(&self) -> Vec<MessageHandle> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Ids of withdrawn surfaces.
    pub fn withdrawn_surfaces(&self) -> Vec<SurfaceId> {
        self.withdrawn.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_text(&self, text: &str) -> Result<MessageHandle> {
        let handle = MessageHandle(self.next());
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((handle, text.to_string()));
        }
        Ok(handle)
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()> {
        if let Ok(mut edits) = self.edits.lock() {
            edits.push((handle, text.to_string()));
        }
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(handle);
        }
        Ok(())
    }

    async fn present_choices(
        &self,
        participant: &ParticipantHandle,
        items: &[Item],
    ) -> Result<ChoiceSurface> {
        let id = SurfaceId(self.next());
        let (reply, receiver) = oneshot::channel();
        // The test may have dropped its receiver; the surface then simply
        // never resolves, which is a legal participant behavior.
        let _ = self.presented_tx.send(PresentedSurface {
            id,
            participant: participant.name.clone(),
            items: items.to_vec(),
            reply,
        });
        Ok(ChoiceSurface { id, receiver })
    }

    async fn withdraw_choices(&self, id: SurfaceId) -> Result<()> {
        if let Ok(mut withdrawn) = self.withdrawn.lock() {
            withdrawn.push(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_record() {
        let (notifier, _rx) = MockNotifier::new();
        let handle = notifier.send_text("hello").await.unwrap();
        notifier.edit_text(handle, "edited").await.unwrap();
        notifier.delete_message(handle).await.unwrap();

        assert_eq!(notifier.sent_texts(), vec!["hello"]);
        assert_eq!(notifier.edited_texts(), vec!["edited"]);
        assert_eq!(notifier.deleted_messages(), vec![handle]);
    }

    #[tokio::test]
    async fn test_present_forwards_surface() {
        let (notifier, mut rx) = MockNotifier::new();
        let participant = ParticipantHandle::new("alice", "m-alice", 0);
        let items = vec![Item::new("254", "The Cheesy Poofs")];

        let surface = notifier.present_choices(&participant, &items).await.unwrap();
        let presented = rx.recv().await.unwrap();
        assert_eq!(presented.participant, "alice");
        assert_eq!(presented.items.len(), 1);
        assert_eq!(presented.id, surface.id);

        presented
            .reply
            .send(ChoiceEvent::Choice("254".into()))
            .unwrap();
        let event = surface.receiver.await.unwrap();
        assert_eq!(event, ChoiceEvent::Choice("254".into()));
    }

    #[tokio::test]
    async fn test_withdraw_recorded() {
        let (notifier, _rx) = MockNotifier::new();
        notifier.withdraw_choices(SurfaceId(7)).await.unwrap();
        assert_eq!(notifier.withdrawn_surfaces(), vec![SurfaceId(7)]);
    }
}
