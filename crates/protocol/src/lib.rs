//! Wire types for the textern message protocol.
//!
//! Two channels carry these types:
//!
//! - **Page context ⇄ coordinator** ([`content`]): registration requests from a page,
//!   text and shortcut instructions back to it. Each message travels inside an
//!   [`Envelope`] naming the sender identity and the originating context.
//! - **Coordinator ⇄ helper** ([`native`]): the single multiplexed channel to the
//!   external helper process, tagged by `type` with a `payload` body.
//!
//! Session identity is defined in [`ids`].

pub mod content;
pub mod ids;
pub mod native;

pub use content::{ContentMessage, ContentRequest, EditableKind, Envelope};
pub use ids::{ContextId, GlobalId, LocalId, ParseIdError};
pub use native::{
	DeathNotice, HelperError, Inbound, NativeEvent, NativePrefs, NativeRequest, NewText, TextUpdate,
};
