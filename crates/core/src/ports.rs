//! Message delivery across the page/coordinator boundary.
//!
//! Hosts implement these to connect a [`SessionRegistry`](crate::SessionRegistry)
//! with its page contexts. A send may fail when the receiving side has gone away;
//! callers log such failures and do not retry.

use async_trait::async_trait;
use textern_protocol::{ContentMessage, ContentRequest, Envelope};

use crate::error::Result;

/// Delivers coordinator messages to page contexts.
#[async_trait]
pub trait ContextPort: Send + Sync {
	async fn send(&self, envelope: Envelope<ContentMessage>) -> Result<()>;
}

/// Delivers page requests to the coordinator.
#[async_trait]
pub trait CoordinatorPort: Send + Sync {
	async fn send(&self, envelope: Envelope<ContentRequest>) -> Result<()>;
}
