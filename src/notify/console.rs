//! Console notification surface - a line-oriented stand-in for a chat
//! platform, used by the `run` command.
//!
//! Status messages print to stdout. A choice surface is an open prompt for
//! one participant; input lines of the form `<name> <item-key>` or
//! `<name> skip` resolve it. The process owner feeds lines in via
//! [`ConsoleNotifier::feed_line`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use colored::*;
use tokio::sync::oneshot;

use super::{ChoiceEvent, ChoiceSurface, MessageHandle, Notifier, SurfaceId};
use crate::domain::{Item, ParticipantHandle};
use crate::error::Result;

struct PendingSurface {
    id: SurfaceId,
    reply: oneshot::Sender<ChoiceEvent>,
}

pub struct ConsoleNotifier {
    next_id: AtomicU64,
    /// One open surface per participant name.
    open: Mutex<HashMap<String, PendingSurface>>,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashMap::new()),
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Feed one input line. Returns true if it resolved an open surface.
    pub fn feed_line(&self, line: &str) -> bool {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let (Some(name), Some(rest)) = (parts.next(), parts.next()) else {
            return false;
        };
        let rest = rest.trim();

        let Ok(mut open) = self.open.lock() else {
            return false;
        };
        let Some(pending) = open.remove(name) else {
            return false;
        };

        let event = if rest.eq_ignore_ascii_case("skip") {
            ChoiceEvent::SkipRequest
        } else {
            ChoiceEvent::Choice(rest.into())
        };
        // A dropped receiver means the surface was already retired
        pending.reply.send(event).is_ok()
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_text(&self, text: &str) -> Result<MessageHandle> {
        let handle = MessageHandle(self.next());
        println!("{text}");
        Ok(handle)
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()> {
        println!("{} {text}", format!("[update #{}]", handle.0).dimmed());
        Ok(())
    }

    async fn delete_message(&self, _handle: MessageHandle) -> Result<()> {
        // Printed lines cannot be unprinted
        Ok(())
    }

    async fn present_choices(
        &self,
        participant: &ParticipantHandle,
        items: &[Item],
    ) -> Result<ChoiceSurface> {
        let id = SurfaceId(self.next());
        let (reply, receiver) = oneshot::channel();

        println!(
            "{} {} may pick: {}",
            ">".cyan(),
            participant.name.bold(),
            items
                .iter()
                .map(|item| format!("{} ({})", item.key, item.label))
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  {}",
            format!("type `{} <item-key>` or `{} skip`", participant.name, participant.name)
                .dimmed()
        );

        let mut open = self
            .open
            .lock()
            .map_err(|e| crate::error::DraftError::Notify(e.to_string()))?;
        // A fresh surface for the same participant replaces the old prompt
        open.insert(participant.name.clone(), PendingSurface { id, reply });
        Ok(ChoiceSurface { id, receiver })
    }

    async fn withdraw_choices(&self, id: SurfaceId) -> Result<()> {
        let mut open = self
            .open
            .lock()
            .map_err(|e| crate::error::DraftError::Notify(e.to_string()))?;
        open.retain(|_, pending| pending.id != id);
        Ok(())
    }
}
