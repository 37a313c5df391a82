//! The shared connection to the helper process.
//!
//! A [`Bridge`] is one open duplex channel. Outbound requests are queued on an
//! unbounded channel and written by a single task, so frames leave in `post` order.
//! Inbound frames are handed to a [`BridgeListener`] one at a time, in arrival order.
//!
//! # Lifecycle
//!
//! - [`BridgeLauncher::open`] starts the connection and its tasks.
//! - [`Bridge::close`] is a local close: the writer stops, the child (if any) is
//!   killed, and the listener is **not** told about it.
//! - Any other end of the read loop (helper exit, pipe error, bad frame) is an
//!   unexpected close and is reported through [`BridgeListener::on_disconnect`]
//!   exactly once, tagged with the connection's [`ConnectionId`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use textern_protocol::NativeRequest;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::transport::PipeTransport;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Generation tag distinguishing successive connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
	/// Returns a new process-unique id.
	pub fn next() -> Self {
		Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst))
	}
}

impl std::fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Receives what the helper sends.
#[async_trait]
pub trait BridgeListener: Send + Sync {
	/// Called for every decoded frame, sequentially.
	async fn on_message(&self, message: Value);

	/// Called once when the connection ends without a local [`Bridge::close`].
	async fn on_disconnect(&self, connection: ConnectionId);
}

/// One open connection to the helper.
pub trait Bridge: Send + Sync {
	fn id(&self) -> ConnectionId;

	/// Queues a request for the helper.
	///
	/// Fails with [`Error::ChannelClosed`] once the connection is closed or its
	/// writer has died.
	fn post(&self, request: &NativeRequest) -> Result<()>;

	/// Closes the connection locally. Idempotent.
	fn close(&self);
}

/// Opens connections to the helper.
///
/// `open` is synchronous so callers can open a connection without yielding; the
/// I/O runs on tasks spawned onto the current tokio runtime.
pub trait BridgeLauncher: Send + Sync {
	fn open(&self, listener: Arc<dyn BridgeListener>) -> Result<Arc<dyn Bridge>>;
}

/// [`Bridge`] over any pipe pair, optionally owning the helper child process.
pub struct PipeBridge {
	id: ConnectionId,
	outbound_tx: Mutex<Option<mpsc::UnboundedSender<Value>>>,
	closed: Arc<AtomicBool>,
	child: Mutex<Option<Child>>,
}

impl PipeBridge {
	/// Starts writer, reader and dispatch tasks on the current runtime.
	///
	/// # Panics
	///
	/// Panics if called outside a tokio runtime.
	pub fn start<W, R>(writer: W, reader: R, listener: Arc<dyn BridgeListener>, child: Option<Child>) -> Arc<Self>
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let id = ConnectionId::next();
		let (transport, mut message_rx) = PipeTransport::new(writer, reader);
		let (mut sender, receiver) = transport.into_parts();
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
		let closed = Arc::new(AtomicBool::new(false));

		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sender.send(message).await {
					tracing::error!(connection = %id, error = %e, "helper write failed");
					return;
				}
			}
			let _ = sender.close().await;
		});

		let reader_handle = tokio::spawn(receiver.run());

		let dispatch_closed = Arc::clone(&closed);
		tokio::spawn(async move {
			while let Some(message) = message_rx.recv().await {
				listener.on_message(message).await;
			}

			match reader_handle.await {
				Ok(Ok(())) => tracing::debug!(connection = %id, "helper read loop finished"),
				Ok(Err(e)) => tracing::error!(connection = %id, error = %e, "helper read failed"),
				Err(e) => tracing::error!(connection = %id, error = %e, "helper reader task failed"),
			}

			if !dispatch_closed.load(Ordering::SeqCst) {
				listener.on_disconnect(id).await;
			}
		});

		tracing::debug!(connection = %id, "helper connection opened");
		Arc::new(Self {
			id,
			outbound_tx: Mutex::new(Some(outbound_tx)),
			closed,
			child: Mutex::new(child),
		})
	}
}

impl Bridge for PipeBridge {
	fn id(&self) -> ConnectionId {
		self.id
	}

	fn post(&self, request: &NativeRequest) -> Result<()> {
		let message = serde_json::to_value(request)?;
		let guard = self.outbound_tx.lock();
		let tx = guard.as_ref().ok_or(Error::ChannelClosed)?;
		tx.send(message).map_err(|_| Error::ChannelClosed)
	}

	fn close(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.outbound_tx.lock().take();
		if let Some(mut child) = self.child.lock().take() {
			if let Err(e) = child.start_kill() {
				tracing::debug!(connection = %self.id, error = %e, "helper already exited");
			}
		}
		tracing::debug!(connection = %self.id, "helper connection closed");
	}
}

impl Drop for PipeBridge {
	fn drop(&mut self) {
		self.close();
	}
}
