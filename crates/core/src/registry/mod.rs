//! The coordinator: live editing sessions and the shared helper connection.
//!
//! A [`SessionRegistry`] accepts registrations from page contexts, forwards them
//! to the helper over a single [`Bridge`], and routes the helper's updates back to
//! the context a session came from.
//!
//! # Invariants
//!
//! - At most one live session exists per [`GlobalId`].
//! - The helper connection is open exactly while at least one session is live.
//!
//! Both hold because every check-and-update of the session map happens under one
//! synchronous lock that is never held across an `.await`. A registration claims
//! its id before reading preferences, so a duplicate arriving during that read is
//! rejected. Anything that fails after the claim is undone with an explicit
//! unregister.
//!
//! # Helper failures
//!
//! An unexpected close of the helper connection, or a failed post to it, ends every
//! live session at once. This is only logged: the user is not notified per session.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use textern_protocol::{
	ContentMessage, ContentRequest, ContextId, EditableKind, Envelope, GlobalId, Inbound, LocalId, NativeEvent,
	NativeRequest, NewText, TextUpdate,
};
use textern_runtime::{Bridge, BridgeLauncher, BridgeListener, ConnectionId};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::notify::{ALREADY_EDITING, LogNotifier, Notifier, error_message};
use crate::ports::ContextPort;
use crate::prefs::{MemoryStore, PreferenceStore, Preferences};

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("session {0} is already being edited")]
	AlreadyEditing(GlobalId),

	#[error("helper unavailable: {0}")]
	BridgeUnavailable(#[source] textern_runtime::Error),

	#[error("could not read preferences: {0}")]
	Preferences(#[source] crate::Error),

	/// The session was torn down while its registration was still in flight.
	#[error("session {0} ended before reaching the helper")]
	Interrupted(GlobalId),
}

/// Whether the helper connection is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Closed,
	Open,
}

/// A field checked out for external editing.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
	pub id: GlobalId,
	pub kind: Option<EditableKind>,
	pub url: String,
	/// Filled in once the preference snapshot has been read.
	pub preferences: Option<Preferences>,
}

impl Session {
	pub fn context(&self) -> &ContextId {
		self.id.context()
	}

	pub fn local(&self) -> LocalId {
		self.id.local()
	}
}

/// Everything a page sends when it checks out a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
	pub context: ContextId,
	pub local: LocalId,
	pub text: String,
	pub caret: usize,
	pub url: String,
	pub kind: Option<EditableKind>,
}

impl Registration {
	pub fn new(context: ContextId, local: LocalId, text: impl Into<String>) -> Self {
		Self {
			context,
			local,
			text: text.into(),
			caret: 0,
			url: String::new(),
			kind: None,
		}
	}

	pub fn caret(mut self, caret: usize) -> Self {
		self.caret = caret;
		self
	}

	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	pub fn kind(mut self, kind: EditableKind) -> Self {
		self.kind = Some(kind);
		self
	}
}

struct OpenBridge {
	id: ConnectionId,
	bridge: Arc<dyn Bridge>,
}

#[derive(Default)]
struct State {
	sessions: IndexMap<GlobalId, Session>,
	bridge: Option<OpenBridge>,
}

pub struct SessionRegistry {
	identity: String,
	launcher: Arc<dyn BridgeLauncher>,
	contexts: Arc<dyn ContextPort>,
	preferences: Arc<dyn PreferenceStore>,
	notifier: Arc<dyn Notifier>,
	state: Mutex<State>,
	this: Weak<SessionRegistry>,
}

/// Builder for [`SessionRegistry`].
pub struct RegistryBuilder {
	identity: String,
	launcher: Arc<dyn BridgeLauncher>,
	contexts: Arc<dyn ContextPort>,
	preferences: Arc<dyn PreferenceStore>,
	notifier: Arc<dyn Notifier>,
}

impl RegistryBuilder {
	/// Store read on each registration. Defaults to an empty [`MemoryStore`].
	pub fn preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
		self.preferences = store;
		self
	}

	/// Defaults to [`LogNotifier`].
	pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	pub fn build(self) -> Arc<SessionRegistry> {
		Arc::new_cyclic(|this| SessionRegistry {
			identity: self.identity,
			launcher: self.launcher,
			contexts: self.contexts,
			preferences: self.preferences,
			notifier: self.notifier,
			state: Mutex::new(State::default()),
			this: this.clone(),
		})
	}
}

impl SessionRegistry {
	/// Starts building a registry for the extension `identity`.
	pub fn builder(
		identity: impl Into<String>,
		launcher: Arc<dyn BridgeLauncher>,
		contexts: Arc<dyn ContextPort>,
	) -> RegistryBuilder {
		RegistryBuilder {
			identity: identity.into(),
			launcher,
			contexts,
			preferences: Arc::new(MemoryStore::new()),
			notifier: Arc::new(LogNotifier),
		}
	}

	pub fn connection_state(&self) -> ConnectionState {
		match self.state.lock().bridge {
			Some(_) => ConnectionState::Open,
			None => ConnectionState::Closed,
		}
	}

	/// Generation of the open connection, if any.
	pub fn connection_id(&self) -> Option<ConnectionId> {
		self.state.lock().bridge.as_ref().map(|open| open.id)
	}

	/// Live session ids in registration order.
	pub fn sessions(&self) -> Vec<GlobalId> {
		self.state.lock().sessions.keys().cloned().collect()
	}

	pub fn session(&self, id: &GlobalId) -> Option<Session> {
		self.state.lock().sessions.get(id).cloned()
	}

	pub fn is_live(&self, id: &GlobalId) -> bool {
		self.state.lock().sessions.contains_key(id)
	}

	fn listener(&self) -> Arc<dyn BridgeListener> {
		Arc::new(RegistryListener {
			registry: self.this.clone(),
		})
	}

	/// Entry point for envelopes from page contexts.
	///
	/// Envelopes from a foreign sender are dropped and yield `Ok(None)`.
	pub async fn handle_content(&self, envelope: Envelope<ContentRequest>) -> Result<Option<GlobalId>, RegistryError> {
		if !envelope.is_from(&self.identity) {
			trace!(sender = %envelope.sender, "ignoring request from foreign sender");
			return Ok(None);
		}
		match envelope.message {
			ContentRequest::RegisterText {
				local_id,
				text,
				caret,
				url,
				kind,
			} => {
				let registration = Registration {
					context: envelope.context,
					local: local_id,
					text,
					caret,
					url,
					kind,
				};
				self.register_session(registration).await.map(Some)
			}
		}
	}

	/// Checks out a field and hands it to the helper.
	pub async fn register_session(&self, registration: Registration) -> Result<GlobalId, RegistryError> {
		let Registration {
			context,
			local,
			text,
			caret,
			url,
			kind,
		} = registration;
		let id = GlobalId::new(context, local);

		let connection = {
			let mut state = self.state.lock();
			if state.sessions.contains_key(&id) {
				drop(state);
				debug!(id = %id, "rejecting duplicate registration");
				self.notifier.notify(&error_message(ALREADY_EDITING));
				return Err(RegistryError::AlreadyEditing(id));
			}
			state.sessions.insert(
				id.clone(),
				Session {
					id: id.clone(),
					kind,
					url: url.clone(),
					preferences: None,
				},
			);
			let current = state.bridge.as_ref().map(|open| open.id);
			match current {
				Some(connection) => connection,
				None => match self.launcher.open(self.listener()) {
					Ok(bridge) => {
						let connection = bridge.id();
						info!(connection = %connection, "opened helper connection");
						state.bridge = Some(OpenBridge { id: connection, bridge });
						connection
					}
					Err(err) => {
						drop(state);
						warn!(id = %id, error = %err, "could not open helper connection");
						self.unregister_session(&id);
						self.notifier.notify(&error_message(&err.to_string()));
						return Err(RegistryError::BridgeUnavailable(err));
					}
				},
			}
		};
		debug!(id = %id, connection = %connection, "session registered");

		let prefs = match Preferences::snapshot(self.preferences.as_ref()).await {
			Ok(prefs) => prefs,
			Err(err) => {
				warn!(id = %id, error = %err, "could not read preferences");
				self.unregister_session(&id);
				self.notifier.notify(&error_message(&err.to_string()));
				return Err(RegistryError::Preferences(err));
			}
		};

		let bridge = {
			let mut state = self.state.lock();
			let current = state
				.bridge
				.as_ref()
				.filter(|open| open.id == connection)
				.map(|open| Arc::clone(&open.bridge));
			match (state.sessions.get_mut(&id), current) {
				(Some(session), Some(bridge)) => {
					session.preferences = Some(prefs.clone());
					bridge
				}
				_ => {
					drop(state);
					debug!(id = %id, "session ended while reading preferences");
					return Err(RegistryError::Interrupted(id));
				}
			}
		};

		let request = NativeRequest::NewText(NewText {
			id: id.clone(),
			text,
			caret,
			url,
			prefs: prefs.to_native(),
		});
		if let Err(err) = bridge.post(&request) {
			warn!(id = %id, error = %err, "failed to reach helper, dropping all sessions");
			self.drop_connection(connection);
			return Err(RegistryError::BridgeUnavailable(err));
		}
		debug!(id = %id, "sent new_text");
		Ok(id)
	}

	/// Ends a session. Closes the helper connection when it was the last one.
	///
	/// Returns false if `id` was not live.
	pub fn unregister_session(&self, id: &GlobalId) -> bool {
		let closing = {
			let mut state = self.state.lock();
			if state.sessions.shift_remove(id).is_none() {
				drop(state);
				debug!(id = %id, "unregister for unknown session");
				return false;
			}
			if state.sessions.is_empty() {
				state.bridge.take()
			} else {
				None
			}
		};
		debug!(id = %id, "session unregistered");
		if let Some(open) = closing {
			info!(connection = %open.id, "no sessions left, closing helper connection");
			open.bridge.close();
		}
		true
	}

	/// Dispatches one frame received from the helper.
	pub async fn handle_inbound(&self, message: Value) {
		match Inbound::from_value(message) {
			Inbound::Known(NativeEvent::TextUpdate(update)) => self.forward_update(update).await,
			Inbound::Known(NativeEvent::DeathNotice(notice)) => {
				self.unregister_session(&notice.id);
			}
			Inbound::Known(NativeEvent::Error(error)) => {
				warn!(error = %error.error, "helper reported an error");
				self.notifier.notify(&error_message(&error.error));
			}
			Inbound::Unrecognized(kind) => warn!(kind = %kind, "ignoring unrecognized helper message"),
			Inbound::Malformed(err) => warn!(error = %err, "ignoring malformed helper message"),
		}
	}

	async fn forward_update(&self, update: TextUpdate) {
		let TextUpdate { id, text } = update;
		if !self.is_live(&id) {
			warn!(id = %id, "dropping update for unknown session");
			return;
		}
		let message = ContentMessage::SetText {
			local_id: id.local(),
			text,
		};
		let envelope = Envelope::new(self.identity.clone(), id.context().clone(), message);
		match self.contexts.send(envelope).await {
			Ok(()) => debug!(id = %id, "forwarded text update"),
			Err(err) => warn!(id = %id, error = %err, "could not deliver text update"),
		}
	}

	/// Reacts to the helper connection ending on its own.
	///
	/// Every live session ends with it. A report from a connection that is no
	/// longer current is ignored.
	pub fn handle_disconnect(&self, connection: ConnectionId) {
		match self.drop_connection(connection) {
			Some(dropped) => warn!(connection = %connection, sessions = dropped, "helper connection lost"),
			None => debug!(connection = %connection, "ignoring disconnect of stale connection"),
		}
	}

	/// Closes `connection` and ends every session if it is still the current one.
	///
	/// Returns the number of sessions dropped, or `None` for a stale connection.
	fn drop_connection(&self, connection: ConnectionId) -> Option<usize> {
		let (open, dropped) = {
			let mut state = self.state.lock();
			if state.bridge.as_ref().map(|open| open.id) != Some(connection) {
				return None;
			}
			let dropped = state.sessions.len();
			state.sessions.clear();
			(state.bridge.take(), dropped)
		};
		if let Some(open) = open {
			open.bridge.close();
		}
		Some(dropped)
	}

	/// Asks a context to begin editing its focused field.
	pub async fn trigger_shortcut(&self, context: ContextId) -> crate::Result<()> {
		let envelope = Envelope::new(self.identity.clone(), context.clone(), ContentMessage::Shortcut);
		self.contexts.send(envelope).await.inspect_err(|err| {
			warn!(context = %context, error = %err, "could not deliver shortcut");
		})
	}

	/// Ends every session and closes the helper connection.
	///
	/// Returns the number of sessions that were live.
	pub fn shutdown(&self) -> usize {
		let (open, dropped) = {
			let mut state = self.state.lock();
			let dropped = state.sessions.len();
			state.sessions.clear();
			(state.bridge.take(), dropped)
		};
		if let Some(open) = open {
			open.bridge.close();
		}
		info!(sessions = dropped, "registry shut down");
		dropped
	}
}

/// Feeds bridge callbacks into the registry without keeping it alive.
struct RegistryListener {
	registry: Weak<SessionRegistry>,
}

#[async_trait]
impl BridgeListener for RegistryListener {
	async fn on_message(&self, message: Value) {
		if let Some(registry) = self.registry.upgrade() {
			registry.handle_inbound(message).await;
		}
	}

	async fn on_disconnect(&self, connection: ConnectionId) {
		if let Some(registry) = self.registry.upgrade() {
			registry.handle_disconnect(connection);
		}
	}
}
