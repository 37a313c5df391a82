use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) {
	let bytes = serde_json::to_vec(message).unwrap();
	writer.write_all(&(bytes.len() as u32).to_ne_bytes()).await.unwrap();
	writer.write_all(&bytes).await.unwrap();
	writer.flush().await.unwrap();
}

#[test]
fn test_length_prefix_uses_native_byte_order() {
	let length: u32 = 1234;
	let bytes = length.to_ne_bytes();
	assert_eq!(u32::from_ne_bytes(bytes), length);
	if cfg!(target_endian = "little") {
		assert_eq!(bytes, [0xD2, 0x04, 0x00, 0x00]);
	}
}

#[tokio::test]
async fn test_send_message() {
	// stdin pipe: transport writes, we read
	let (mut helper_stdin, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, _stdout_write) = tokio::io::duplex(1024);

	let (transport, _rx) = PipeTransport::new(stdin_write, stdout_read);
	let (mut sender, _receiver) = transport.into_parts();

	let message = json!({"type": "new_text", "payload": {"id": "7_0", "text": "hi"}});
	sender.send(message.clone()).await.unwrap();

	let mut len_buf = [0u8; 4];
	helper_stdin.read_exact(&mut len_buf).await.unwrap();
	let length = u32::from_ne_bytes(len_buf) as usize;

	let mut body = vec![0u8; length];
	helper_stdin.read_exact(&mut body).await.unwrap();

	let received: Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(received, message);
}

#[tokio::test]
async fn test_multiple_messages_in_sequence() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(4096);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(4096);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let messages = vec![
		json!({"type": "text_update", "payload": {"id": "7_0", "text": "a"}}),
		json!({"type": "text_update", "payload": {"id": "7_0", "text": "ab"}}),
		json!({"type": "death_notice", "payload": {"id": "7_0"}}),
	];
	for msg in &messages {
		write_frame(&mut stdout_write, msg).await;
	}

	for expected in &messages {
		let received = rx.recv().await.unwrap();
		assert_eq!(&received, expected);
	}

	drop(stdout_write);
	let result = read_task.await.unwrap();
	assert!(result.is_ok(), "clean EOF should end the loop: {result:?}");
}

#[tokio::test]
async fn test_large_message() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024 * 1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024 * 1024);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let large_message = json!({
		"type": "text_update",
		"payload": {"id": "7_0", "text": "x".repeat(100_000)}
	});
	write_frame(&mut stdout_write, &large_message).await;

	let received = rx.recv().await.unwrap();
	assert_eq!(received, large_message);

	drop(stdout_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_malformed_length_prefix() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	// Only 2 of the 4 prefix bytes before EOF
	stdout_write.write_all(&[0x01, 0x02]).await.unwrap();
	stdout_write.flush().await.unwrap();
	drop(stdout_write);

	let result = transport.run().await;
	assert!(result.is_err());
	assert!(result.unwrap_err().to_string().contains("Failed to read length prefix"));
}

#[tokio::test]
async fn test_truncated_body() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	stdout_write.write_all(&100u32.to_ne_bytes()).await.unwrap();
	stdout_write.write_all(b"{\"type\"").await.unwrap();
	drop(stdout_write);

	let err = transport.run().await.unwrap_err();
	assert!(err.to_string().contains("Failed to read message body"), "{err}");
}

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	stdout_write.write_all(&u32::MAX.to_ne_bytes()).await.unwrap();
	drop(stdout_write);

	let err = transport.run().await.unwrap_err();
	assert!(matches!(err, Error::FrameTooLarge(_)), "{err}");
}

#[tokio::test]
async fn test_invalid_json_body() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	stdout_write.write_all(&3u32.to_ne_bytes()).await.unwrap();
	stdout_write.write_all(b"{{{").await.unwrap();
	drop(stdout_write);

	let err = transport.run().await.unwrap_err();
	assert!(matches!(err, Error::Json(_)), "{err}");
}

#[tokio::test]
async fn test_graceful_shutdown_when_receiver_dropped() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, rx) = PipeTransport::new(stdin_write, stdout_read);
	drop(rx);

	write_frame(&mut stdout_write, &json!({"type": "error", "payload": {"error": "x"}})).await;

	let result = transport.run().await;
	assert!(result.is_ok());
}
