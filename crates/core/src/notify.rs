//! User-visible notifications.

use tracing::warn;

pub const NO_TEXT_FIELD: &str = "no text field selected";
pub const ALREADY_EDITING: &str = "this text is already being edited";

/// Shows short messages to the user.
pub trait Notifier: Send + Sync {
	fn notify(&self, message: &str);
}

/// Notifier for headless hosts: every message becomes a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn notify(&self, message: &str) {
		warn!(text = message, "notification");
	}
}

/// Wording for an error shown to the user.
pub fn error_message(error: &str) -> String {
	format!("Error: {error}.")
}
