//! Textern: edit in-page text fields in an external editor.
//!
//! Two sides cooperate:
//!
//! - **Page side** ([`PageContext`]): one per page context. It resolves the focused
//!   field through shadow trees ([`resolver`]), reads and writes its text with the
//!   right [`adapter`], tracks the fields it handed out ([`tracker`]) and keeps the
//!   keyboard [`shortcut`] bound.
//! - **Coordinator** ([`SessionRegistry`]): one per browser. It owns the live
//!   sessions and the single connection to the helper process, which launches the
//!   user's editor and reports every save.
//!
//! Messages between the two sides travel through the [`ports`] traits; the wire
//! types live in [`protocol`].

pub mod adapter;
pub mod dom;
pub mod error;
pub mod notify;
pub mod page;
pub mod ports;
pub mod prefs;
pub mod registry;
pub mod resolver;
pub mod shortcut;
pub mod tracker;

pub use adapter::{EditableHandle, EditableKind};
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use notify::{LogNotifier, Notifier};
pub use page::PageContext;
pub use ports::{ContextPort, CoordinatorPort};
pub use prefs::{MemoryStore, PreferenceStore, Preferences};
pub use registry::{ConnectionState, Registration, RegistryError, Session, SessionRegistry};
pub use shortcut::{KeyChord, KeyEvent, Modifiers};
pub use textern_protocol as protocol;
pub use tracker::SessionTracker;
