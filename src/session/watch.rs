//! Deadline watching - the per-pick timeout future, with reminder emission.
//!
//! The watcher completes when the deadline passes. While waiting it polls on
//! a one-second tick and sends each configured reminder at most once when its
//! offset before the deadline is reached. Dropping the future (because the
//! race resolved another way) cancels both the timeout and the reminders.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::domain::ParticipantHandle;
use crate::notify::{MessageHandle, Notifier};

/// Human phrasing for a reminder offset.
fn describe_offset(offset: TimeDelta) -> String {
    let minutes = offset.num_minutes();
    if minutes >= 60 && minutes % 60 == 0 {
        let hours = minutes / 60;
        format!("{hours} hour{}", if hours == 1 { "" } else { "s" })
    } else {
        format!("{minutes} minutes")
    }
}

/// Wait out the deadline for `drafter`'s pick, emitting reminders along the
/// way. Sent reminder handles are pushed into `reminders` so the caller can
/// delete them after the opportunity resolves, even if this future is
/// cancelled mid-wait.
///
/// `offsets` is interpreted as offsets before the deadline and may arrive in
/// any order; each fires at most once.
pub async fn watch_deadline(
    notifier: Arc<dyn Notifier>,
    event_id: String,
    drafter: ParticipantHandle,
    deadline: DateTime<Utc>,
    offsets: Vec<TimeDelta>,
    reminders: Arc<Mutex<Vec<MessageHandle>>>,
) {
    let mut offsets = offsets;
    offsets.sort_by_key(|offset| std::cmp::Reverse(*offset));
    let mut next_reminder = 0usize;

    loop {
        let now = Utc::now();
        if now >= deadline {
            return;
        }

        while next_reminder < offsets.len() && now >= deadline - offsets[next_reminder] {
            let text = format!(
                "{}, you have {} left to pick for {}!",
                drafter.name,
                describe_offset(offsets[next_reminder]),
                event_id
            );
            match notifier.send_text(&text).await {
                Ok(handle) => {
                    if let Ok(mut sent) = reminders.lock() {
                        sent.push(handle);
                    }
                }
                Err(e) => warn!(drafter = %drafter.name, "failed to send pick reminder: {e}"),
            }
            next_reminder += 1;
        }

        // One-second tick, shortened at the end so the timeout does not
        // overshoot the deadline.
        let remaining = (deadline - now)
            .to_std()
            .unwrap_or(Duration::from_millis(0));
        tokio::time::sleep(remaining.min(Duration::from_secs(1))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;

    fn drafter() -> ParticipantHandle {
        ParticipantHandle::new("alice", "m-alice", 0)
    }

    #[test]
    fn test_describe_offset_hours() {
        assert_eq!(describe_offset(TimeDelta::minutes(120)), "2 hours");
        assert_eq!(describe_offset(TimeDelta::minutes(60)), "1 hour");
    }

    #[test]
    fn test_describe_offset_minutes() {
        assert_eq!(describe_offset(TimeDelta::minutes(30)), "30 minutes");
        assert_eq!(describe_offset(TimeDelta::minutes(90)), "90 minutes");
    }

    #[tokio::test]
    async fn test_completes_when_deadline_passed() {
        let (notifier, _rx) = MockNotifier::new();
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        let reminders = Arc::new(Mutex::new(Vec::new()));
        watch_deadline(
            Arc::clone(&notifier),
            "evt".to_string(),
            drafter(),
            Utc::now() - TimeDelta::seconds(5),
            vec![TimeDelta::minutes(120)],
            reminders,
        )
        .await;
        // Already past the deadline: no reminder is sent
    }

    #[tokio::test]
    async fn test_reminders_fire_once_each() {
        let (notifier, _rx) = MockNotifier::new();
        let notifier = Arc::new(notifier);
        let reminders = Arc::new(Mutex::new(Vec::new()));

        // Deadline just ahead, both offsets already reached: each fires once
        // before the watcher returns.
        watch_deadline(
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            "evt".to_string(),
            drafter(),
            Utc::now() + TimeDelta::milliseconds(300),
            vec![TimeDelta::minutes(120), TimeDelta::minutes(30)],
            Arc::clone(&reminders),
        )
        .await;

        let texts = notifier.sent_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("2 hours"));
        assert!(texts[1].contains("30 minutes"));
        assert_eq!(reminders.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreached_offsets_do_not_fire() {
        let (notifier, _rx) = MockNotifier::new();
        let notifier = Arc::new(notifier);
        let reminders = Arc::new(Mutex::new(Vec::new()));

        watch_deadline(
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            "evt".to_string(),
            drafter(),
            Utc::now() + TimeDelta::milliseconds(200),
            // Offset far smaller than the time remaining... never reached
            vec![TimeDelta::milliseconds(1)],
            Arc::clone(&reminders),
        )
        .await;

        // The 1ms-before-deadline reminder may fire on the final tick; the
        // important invariant is it fires at most once.
        assert!(notifier.sent_texts().len() <= 1);
    }
}
