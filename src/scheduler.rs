//! Reminder delivery loop.
//!
//! Wakes every `reminder_check_minutes`, finds reminders that are due and
//! not yet notified, and pushes each through the notifier. A failed single
//! notification is logged and skipped — one bad delivery must not abort the
//! rest of the batch. That swallow-and-continue policy lives here and only
//! here; the core query and reminder components surface every error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::WorkdeskDb;
use crate::notification::Notifier;

/// Run the reminder check loop forever. The loop owns its own database
/// handle so it never contends with request handling for a connection.
pub async fn run_reminder_loop(db: WorkdeskDb, interval_minutes: u64, notifier: Arc<dyn Notifier>) {
    let interval = Duration::from_secs(interval_minutes.max(1) * 60);
    loop {
        tokio::time::sleep(interval).await;
        match check_due_reminders(&db, notifier.as_ref()) {
            Ok(0) => {}
            Ok(n) => log::info!("Delivered {n} reminder notification(s)"),
            Err(e) => log::warn!("Reminder check failed: {e}"),
        }
    }
}

/// One pass over the due queue. Returns how many notifications were
/// delivered and recorded.
pub fn check_due_reminders(
    db: &WorkdeskDb,
    notifier: &dyn Notifier,
) -> Result<usize, crate::db::DbError> {
    let now = Utc::now().to_rfc3339();
    let due = db.list_due_reminders(&now)?;

    let mut delivered = 0;
    for reminder in due {
        let message = reminder.message.as_deref().unwrap_or("Reminder is due.");
        match notifier.send(&reminder.title, message) {
            Ok(()) => {
                db.mark_reminder_notified(&reminder.id, &now)?;
                delivered += 1;
            }
            Err(e) => {
                log::warn!("Notification for reminder '{}' failed: {e}", reminder.id);
            }
        }
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbReminder;
    use std::sync::Mutex;

    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_titles: Vec<String>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, title: &str, _message: &str) -> Result<(), String> {
            if self.fail_titles.iter().any(|t| t == title) {
                return Err("delivery failed".to_string());
            }
            self.sent.lock().unwrap().push(title.to_string());
            Ok(())
        }
    }

    fn reminder(id: &str, title: &str, due_at: &str) -> DbReminder {
        let now = chrono::Utc::now().to_rfc3339();
        DbReminder {
            id: id.to_string(),
            title: title.to_string(),
            message: None,
            due_at: due_at.to_string(),
            completed: false,
            completed_at: None,
            notified_at: None,
            recurrence_frequency: None,
            recurrence_day_of_week: None,
            recurrence_day_of_month: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_due_reminders_are_delivered_once() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_reminder(&reminder("r1", "standup", "2020-01-01T09:00:00+00:00"))
            .unwrap();

        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail_titles: Vec::new(),
        };
        assert_eq!(check_due_reminders(&db, &notifier).unwrap(), 1);
        // Second pass: already notified, nothing to deliver.
        assert_eq!(check_due_reminders(&db, &notifier).unwrap(), 0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_one_failed_delivery_does_not_abort_the_batch() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_reminder(&reminder("r1", "broken", "2020-01-01T09:00:00+00:00"))
            .unwrap();
        db.create_reminder(&reminder("r2", "standup", "2020-01-01T10:00:00+00:00"))
            .unwrap();

        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail_titles: vec!["broken".to_string()],
        };
        assert_eq!(check_due_reminders(&db, &notifier).unwrap(), 1);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["standup"]);

        // The failed reminder stays in the due queue for the next pass.
        let due = db
            .list_due_reminders(&chrono::Utc::now().to_rfc3339())
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "r1");
    }
}
