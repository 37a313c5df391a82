//! Test doubles wiring a registry to page contexts and to an in-process helper.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use textern::protocol::{ContentMessage, ContentRequest, Envelope};
use textern::{ContextPort, CoordinatorPort, Notifier};
use textern_runtime::{Bridge, BridgeLauncher, BridgeListener, PipeBridge, PipeTransport, PipeTransportSender};
use tokio::io::DuplexStream;
use tokio::sync::mpsc;

pub const IDENTITY: &str = "textern@jlebon.com";
const WAIT: Duration = Duration::from_secs(5);

/// The helper's end of one bridge: reads what the coordinator posts and writes
/// frames back.
pub struct FakeHelper {
	requests: mpsc::UnboundedReceiver<Value>,
	sender: PipeTransportSender<DuplexStream>,
}

impl FakeHelper {
	pub async fn next_request(&mut self) -> Value {
		tokio::time::timeout(WAIT, self.requests.recv())
			.await
			.expect("timed out waiting for a request")
			.expect("bridge closed")
	}

	pub async fn reply(&mut self, frame: Value) {
		self.sender.send(frame).await.expect("reply failed");
	}

	/// Closes the helper's stdout, as a crashing helper would.
	pub async fn hang_up(mut self) {
		let _ = self.sender.close().await;
	}
}

/// Opens [`PipeBridge`]s over in-memory pipes and hands out the helper ends.
#[derive(Default)]
pub struct DuplexLauncher {
	helpers: Mutex<Vec<FakeHelper>>,
}

impl DuplexLauncher {
	pub fn take_helper(&self) -> FakeHelper {
		self.helpers.lock().pop().expect("no bridge opened")
	}
}

impl BridgeLauncher for DuplexLauncher {
	fn open(&self, listener: Arc<dyn BridgeListener>) -> textern_runtime::Result<Arc<dyn Bridge>> {
		let (helper_stdin, bridge_writer) = tokio::io::duplex(64 * 1024);
		let (bridge_reader, helper_stdout) = tokio::io::duplex(64 * 1024);
		let bridge = PipeBridge::start(bridge_writer, bridge_reader, listener, None);

		let (transport, requests) = PipeTransport::new(helper_stdout, helper_stdin);
		let (sender, receiver) = transport.into_parts();
		tokio::spawn(receiver.run());
		self.helpers.lock().push(FakeHelper { requests, sender });
		Ok(bridge)
	}
}

/// Queues what the registry sends to page contexts.
pub struct ChannelContextPort(pub mpsc::UnboundedSender<Envelope<ContentMessage>>);

#[async_trait]
impl ContextPort for ChannelContextPort {
	async fn send(&self, envelope: Envelope<ContentMessage>) -> textern::Result<()> {
		let context = envelope.context.clone();
		self.0.send(envelope).map_err(|_| textern::Error::ContextSend {
			context,
			reason: "context gone".into(),
		})
	}
}

/// Queues what a page context sends to the coordinator.
pub struct ChannelCoordinatorPort(pub mpsc::UnboundedSender<Envelope<ContentRequest>>);

#[async_trait]
impl CoordinatorPort for ChannelCoordinatorPort {
	async fn send(&self, envelope: Envelope<ContentRequest>) -> textern::Result<()> {
		let context = envelope.context.clone();
		self.0.send(envelope).map_err(|_| textern::Error::ContextSend {
			context,
			reason: "coordinator gone".into(),
		})
	}
}

#[derive(Default)]
pub struct RecordingNotifier(pub Mutex<Vec<String>>);

impl Notifier for RecordingNotifier {
	fn notify(&self, message: &str) {
		self.0.lock().push(message.to_string());
	}
}

pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
	tokio::time::timeout(WAIT, rx.recv())
		.await
		.expect("timed out waiting for a message")
		.expect("channel closed")
}

/// Polls `check` until it holds or the wait runs out.
pub async fn eventually(mut check: impl FnMut() -> bool) {
	let deadline = tokio::time::Instant::now() + WAIT;
	while !check() {
		assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
}
