//! Textern runtime - the bridge to the external helper process
//!
//! The coordinator talks to exactly one helper at a time over a duplex byte pipe
//! (the helper's stdin/stdout). This crate provides:
//!
//! - **Transport**: native-messaging framing (4-byte native-endian length, then JSON)
//! - **Bridge**: one open connection with a writer queue, a reader loop and a
//!   disconnect callback that fires exactly once on unexpected close
//! - **Helper launch**: spawning the helper executable and wiring its stdio
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   post()    ┌────────────┐   frames   ┌────────┐
//! │ coordinator  │ ──────────▶ │ PipeBridge │ ─────────▶ │ helper │
//! │ (listener)   │ ◀────────── │            │ ◀───────── │        │
//! └──────────────┘ on_message  └────────────┘            └────────┘
//!                  on_disconnect
//! ```

pub mod bridge;
pub mod error;
pub mod helper;
pub mod transport;

pub use bridge::{Bridge, BridgeLauncher, BridgeListener, ConnectionId, PipeBridge};
pub use error::{Error, Result};
pub use helper::{HelperCommand, HelperLauncher};
pub use transport::{MAX_FRAME_LEN, PipeTransport, PipeTransportReceiver, PipeTransportSender};
