//! Notification surface - status text and interactive choice presentation.
//!
//! The draft core needs exactly this much from the outside world: send status
//! text to the draft channel (and edit or delete it later), and open a choice
//! surface in front of a participant. A surface yields at most one terminal
//! event and can be withdrawn; a late event against a withdrawn surface is
//! dropped, never recorded.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{Item, ItemKey, ParticipantHandle};
use crate::error::Result;

pub mod console;
pub mod mock;

pub use console::ConsoleNotifier;
pub use mock::{MockNotifier, PresentedSurface};

/// Handle to a sent status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

/// Handle to an open choice surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Terminal event produced by a choice surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceEvent {
    /// The participant chose an item.
    Choice(ItemKey),
    /// The participant asked to be skipped.
    SkipRequest,
}

/// An open choice surface. The receiver resolves at most once; dropping it
/// (or withdrawing the surface) retires the opportunity.
#[derive(Debug)]
pub struct ChoiceSurface {
    pub id: SurfaceId,
    pub receiver: oneshot::Receiver<ChoiceEvent>,
}

/// Outbound side of the draft: status messages and choice surfaces.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send status text to the draft channel.
    async fn send_text(&self, text: &str) -> Result<MessageHandle>;

    /// Replace the content of a previously sent message.
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()>;

    /// Delete a previously sent message.
    async fn delete_message(&self, handle: MessageHandle) -> Result<()>;

    /// Present `items` to `participant` and return the surface that will
    /// carry their response.
    async fn present_choices(
        &self,
        participant: &ParticipantHandle,
        items: &[Item],
    ) -> Result<ChoiceSurface>;

    /// Retract an open surface; its pending event, if any, is discarded.
    async fn withdraw_choices(&self, id: SurfaceId) -> Result<()>;
}
