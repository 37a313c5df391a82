//! Error types for the helper bridge.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the helper process.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to launch the helper process.
	#[error("Failed to launch helper: {0}")]
	LaunchFailed(String),

	/// Transport-level error (pipe communication).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// The connection was closed, locally or by the helper.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// A frame exceeded [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).
	#[error("Frame of {0} bytes exceeds the maximum frame length")]
	FrameTooLarge(usize),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}
