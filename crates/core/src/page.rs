//! The in-page side of textern: one instance per page context.
//!
//! A [`PageContext`] owns the context's document, tracks the fields it handed
//! out and keeps the keyboard shortcut bound. Registrations go to the coordinator
//! through a [`CoordinatorPort`]; updates come back through
//! [`PageContext::handle_message`].

use std::sync::Arc;

use textern_protocol::{ContentMessage, ContentRequest, ContextId, Envelope, LocalId};
use tracing::{debug, trace, warn};

use crate::adapter;
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::notify::{NO_TEXT_FIELD, Notifier, error_message};
use crate::ports::CoordinatorPort;
use crate::prefs::Preferences;
use crate::resolver;
use crate::shortcut::{KeyEvent, ListenerBinder, ShortcutDispatcher};
use crate::tracker::SessionTracker;

pub struct PageContext {
	identity: String,
	context: ContextId,
	document: Document,
	tracker: SessionTracker,
	shortcuts: ShortcutDispatcher<ListenerBinder>,
	coordinator: Arc<dyn CoordinatorPort>,
	notifier: Arc<dyn Notifier>,
}

impl PageContext {
	pub fn new(
		identity: impl Into<String>,
		context: ContextId,
		document: Document,
		coordinator: Arc<dyn CoordinatorPort>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		let frames = document.frame_count();
		Self {
			identity: identity.into(),
			context,
			document,
			tracker: SessionTracker::new(),
			shortcuts: ShortcutDispatcher::new(ListenerBinder::new(frames)),
			coordinator,
			notifier,
		}
	}

	pub fn context(&self) -> &ContextId {
		&self.context
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Mutable access for the host, e.g. to mirror user input and focus changes.
	pub fn document_mut(&mut self) -> &mut Document {
		&mut self.document
	}

	pub fn tracker(&self) -> &SessionTracker {
		&self.tracker
	}

	pub fn shortcuts(&self) -> &ShortcutDispatcher<ListenerBinder> {
		&self.shortcuts
	}

	/// Registers the focused field with the coordinator.
	///
	/// When focus is not on an editable field the user is told so and
	/// [`Error::NoEditableTarget`] is returned.
	pub async fn begin_editing(&mut self) -> Result<LocalId> {
		let target = resolver::resolve_active(&self.document).and_then(|node| adapter::classify(&self.document, node));
		let Some(handle) = target else {
			self.notifier.notify(&error_message(NO_TEXT_FIELD));
			return Err(Error::NoEditableTarget);
		};

		let local_id = self.tracker.watch(handle);
		let handle = self.tracker.get(local_id).unwrap_or(handle);
		let request = ContentRequest::RegisterText {
			local_id,
			text: adapter::get_text(&self.document, handle),
			caret: adapter::caret(&self.document, handle),
			url: self.document.simple_url(),
			kind: Some(handle.kind()),
		};
		debug!(context = %self.context, local = %local_id, kind = ?handle.kind(), "registering text");

		self.coordinator
			.send(Envelope::new(self.identity.clone(), self.context.clone(), request))
			.await?;
		Ok(local_id)
	}

	/// Applies a message from the coordinator.
	///
	/// Envelopes from any other sender are dropped without error.
	pub async fn handle_message(&mut self, envelope: Envelope<ContentMessage>) -> Result<()> {
		if !envelope.is_from(&self.identity) {
			trace!(sender = %envelope.sender, "ignoring message from foreign sender");
			return Ok(());
		}
		match envelope.message {
			ContentMessage::SetText { local_id, text } => {
				let Some(handle) = self.tracker.get(local_id) else {
					warn!(context = %self.context, local = %local_id, "dropping text for unwatched field");
					return Err(Error::UnknownLocalId(local_id));
				};
				adapter::set_text(&mut self.document, handle, &text)?;
				debug!(context = %self.context, local = %local_id, len = text.len(), "applied text update");
				Ok(())
			}
			ContentMessage::Shortcut => self.begin_editing().await.map(drop),
		}
	}

	/// Handles a key press, beginning an edit when it matches the bound chord.
	///
	/// Returns the registered id if an edit was started.
	pub async fn on_key(&mut self, event: &KeyEvent) -> Result<Option<LocalId>> {
		if !self.shortcuts.binder().handles(event) {
			return Ok(None);
		}
		self.begin_editing().await.map(Some)
	}

	/// Rebinds the shortcut to the configured chord if it changed.
	///
	/// An unparsable chord is logged and the current binding stays.
	pub fn apply_preferences(&mut self, prefs: &Preferences) {
		match prefs.shortcut_chord() {
			Ok(chord) => {
				if self.shortcuts.reconcile(chord, false) {
					debug!(context = %self.context, shortcut = %prefs.shortcut, "bound shortcut");
				}
			}
			Err(err) => warn!(context = %self.context, error = %err, "keeping current shortcut"),
		}
	}

	/// Re-counts the document's frames and forces a rebind if the count changed.
	///
	/// Returns whether a rebind happened.
	pub fn refresh_topology(&mut self) -> bool {
		let frames = self.document.frame_count();
		if frames == self.shortcuts.binder().frames() {
			return false;
		}
		self.shortcuts.binder_mut().set_frames(frames);
		let Some(chord) = self.shortcuts.current().cloned() else {
			return false;
		};
		debug!(context = %self.context, frames, "frame count changed, rebinding shortcut");
		self.shortcuts.reconcile(chord, true)
	}
}
