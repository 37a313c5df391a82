//! JSON-lines host around a [`SessionRegistry`].
//!
//! # Input
//!
//! One JSON object per line on stdin, either a page envelope or a host command:
//!
//! ```json
//! {"sender":"textern@jlebon.com","context":"7","message":{"type":"register_text","localId":0,"text":"hi","caret":2,"url":"example.com/"}}
//! {"command":"shortcut","context":"7"}
//! {"command":"quit"}
//! ```
//!
//! # Output
//!
//! One JSON object per line on stdout:
//!
//! ```json
//! {"context":"7","message":{"type":"set_text","localId":0,"text":"hi there"}}
//! {"registered":"7_0"}
//! {"notification":"Error: this text is already being edited."}
//! {"error":"..."}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use textern::protocol::{ContentMessage, ContentRequest, ContextId, Envelope, GlobalId};
use textern::{ContextPort, Notifier, SessionRegistry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{LinesStream, UnboundedReceiverStream};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HostInput {
	Command(HostCommand),
	Request(Envelope<ContentRequest>),
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
	/// Ask a context to start editing its focused field.
	Shortcut { context: ContextId },
	/// Stop reading input.
	Quit,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HostOutput {
	Deliver { context: ContextId, message: ContentMessage },
	Registered { registered: GlobalId },
	Notification { notification: String },
	Error { error: String },
}

/// Queues output lines. Doubles as the registry's context port and notifier.
#[derive(Debug, Clone)]
pub struct OutputSink(mpsc::UnboundedSender<HostOutput>);

impl OutputSink {
	pub fn emit(&self, output: HostOutput) -> bool {
		self.0.send(output).is_ok()
	}
}

pub fn output_channel() -> (Arc<OutputSink>, mpsc::UnboundedReceiver<HostOutput>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(Arc::new(OutputSink(tx)), rx)
}

#[async_trait]
impl ContextPort for OutputSink {
	async fn send(&self, envelope: Envelope<ContentMessage>) -> textern::Result<()> {
		let Envelope { context, message, .. } = envelope;
		if self.emit(HostOutput::Deliver {
			context: context.clone(),
			message,
		}) {
			Ok(())
		} else {
			Err(textern::Error::ContextSend {
				context,
				reason: "output closed".into(),
			})
		}
	}
}

impl Notifier for OutputSink {
	fn notify(&self, message: &str) {
		warn!(text = message, "notification");
		self.emit(HostOutput::Notification {
			notification: message.to_string(),
		});
	}
}

/// Writes queued outputs as JSON lines until every sender is gone.
pub async fn write_outputs<W>(outputs: mpsc::UnboundedReceiver<HostOutput>, mut writer: W) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	let mut outputs = UnboundedReceiverStream::new(outputs);
	while let Some(output) = outputs.next().await {
		let mut line = serde_json::to_vec(&output)?;
		line.push(b'\n');
		writer.write_all(&line).await?;
		writer.flush().await?;
	}
	Ok(())
}

/// Feeds input lines to `registry` until EOF or a `quit` command.
pub async fn read_inputs<R>(registry: &SessionRegistry, sink: &OutputSink, reader: R) -> std::io::Result<()>
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = LinesStream::new(reader.lines());
	while let Some(line) = lines.next().await {
		let line = line?;
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		let input = match serde_json::from_str::<HostInput>(line) {
			Ok(input) => input,
			Err(err) => {
				warn!(error = %err, "ignoring unparsable input line");
				sink.emit(HostOutput::Error {
					error: format!("unparsable input: {err}"),
				});
				continue;
			}
		};

		match input {
			HostInput::Command(HostCommand::Quit) => {
				debug!("quit requested");
				break;
			}
			HostInput::Command(HostCommand::Shortcut { context }) => {
				// Delivery failures are logged by the registry.
				let _ = registry.trigger_shortcut(context).await;
			}
			HostInput::Request(envelope) => match registry.handle_content(envelope).await {
				Ok(Some(id)) => {
					sink.emit(HostOutput::Registered { registered: id });
				}
				Ok(None) => {}
				Err(err) => {
					sink.emit(HostOutput::Error { error: err.to_string() });
				}
			},
		}
	}
	Ok(())
}
