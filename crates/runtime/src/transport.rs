//! Length-prefixed JSON framing over a byte pipe.
//!
//! This is the browser native-messaging format: each message is a 4-byte length in
//! native byte order followed by that many bytes of UTF-8 JSON. The helper reads
//! frames from its stdin and writes frames to its stdout.
//!
//! [`PipeTransport`] owns both halves until [`into_parts`](PipeTransport::into_parts)
//! splits it into a [`PipeTransportSender`] (writer) and a [`PipeTransportReceiver`]
//! (read loop feeding an unbounded channel).

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Upper bound on a single frame, in bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Bidirectional framed transport over a writer and a reader.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: PipeTransportReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	/// Creates a transport writing to `writer` and reading from `reader`.
	///
	/// Decoded frames are delivered on the returned receiver.
	pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeTransportSender { writer },
			receiver: PipeTransportReceiver { reader, message_tx },
		};
		(transport, message_rx)
	}

	/// Splits into independently owned send and receive halves.
	pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
		(self.sender, self.receiver)
	}

	/// Runs the read loop until EOF or error.
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.read_loop().await
	}
}

/// Writing half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
	writer: W,
}

impl<W: AsyncWrite + Unpin + Send> PipeTransportSender<W> {
	/// Writes one frame and flushes it.
	pub async fn send(&mut self, message: Value) -> Result<()> {
		let bytes = serde_json::to_vec(&message)?;
		if bytes.len() > MAX_FRAME_LEN {
			return Err(Error::FrameTooLarge(bytes.len()));
		}
		let length = bytes.len() as u32;
		self.writer.write_all(&length.to_ne_bytes()).await?;
		self.writer.write_all(&bytes).await?;
		self.writer.flush().await?;
		tracing::trace!(bytes = bytes.len(), "frame sent");
		Ok(())
	}

	/// Shuts the writer down, signalling EOF to the peer.
	pub async fn close(&mut self) -> Result<()> {
		self.writer.shutdown().await?;
		Ok(())
	}
}

/// Reading half of a [`PipeTransport`].
pub struct PipeTransportReceiver<R> {
	reader: R,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<R: AsyncRead + Unpin + Send> PipeTransportReceiver<R> {
	/// Runs the read loop, consuming the receiver.
	///
	/// Returns `Ok(())` on EOF at a frame boundary or when nobody listens anymore.
	pub async fn run(mut self) -> Result<()> {
		self.read_loop().await
	}

	async fn read_loop(&mut self) -> Result<()> {
		loop {
			let Some(length) = self.read_length().await? else {
				tracing::debug!("helper pipe reached EOF");
				return Ok(());
			};
			if length > MAX_FRAME_LEN {
				return Err(Error::FrameTooLarge(length));
			}

			let mut body = vec![0u8; length];
			self.reader
				.read_exact(&mut body)
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read message body: {e}")))?;

			let message: Value = serde_json::from_slice(&body)?;
			if self.message_tx.send(message).is_err() {
				tracing::debug!("message receiver dropped, stopping read loop");
				return Ok(());
			}
		}
	}

	/// Reads the 4-byte prefix. `None` means the pipe closed cleanly between frames.
	async fn read_length(&mut self) -> Result<Option<usize>> {
		let mut prefix = [0u8; 4];
		let mut filled = 0;
		while filled < prefix.len() {
			let n = self
				.reader
				.read(&mut prefix[filled..])
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read length prefix: {e}")))?;
			if n == 0 {
				if filled == 0 {
					return Ok(None);
				}
				return Err(Error::TransportError(format!(
					"Failed to read length prefix: EOF after {filled} of 4 bytes"
				)));
			}
			filled += n;
		}
		Ok(Some(u32::from_ne_bytes(prefix) as usize))
	}
}

#[cfg(test)]
mod tests;
