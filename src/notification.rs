//! Notification delivery wrapper.
//!
//! The scheduler only needs a `send(title, message) -> success` capability;
//! actual desktop delivery is a deployment concern wired in at startup.

use log::info;

pub trait Notifier: Send + Sync {
    fn send(&self, title: &str, message: &str) -> Result<(), String>;
}

/// Default notifier: writes the notification to the log. Stands in on
/// headless deployments and in tests.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, title: &str, message: &str) -> Result<(), String> {
        info!("notification: {title} — {message}");
        Ok(())
    }
}
