//! Frame codec module
//!
//! A frame is a JSON value followed by a single `;` sentinel byte. Payloads
//! travel inside a `{"data": <payload>}` envelope for compatibility with
//! existing clients; the decoder strips that envelope again, so
//! encode-then-decode is identity for any JSON value.

use crate::error::{Result, WireError};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Byte terminating every frame (`;`)
pub const SENTINEL: u8 = 0x3B;

/// Read granularity of the decoder
const CHUNK_SIZE: usize = 1024;

/// Framed JSON codec over a byte stream
#[derive(Debug)]
pub struct FrameStream<S> {
    stream: S,
}

impl<S> FrameStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a byte stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Receive one frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection between
    /// frames (clean EOF). Closing mid-frame is an error.
    pub async fn recv(&mut self) -> Result<Option<Value>> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; CHUNK_SIZE];

        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(WireError::UnexpectedEof);
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.last() == Some(&SENTINEL) {
                break;
            }
        }

        buf.pop();
        let value: Value = serde_json::from_slice(&buf)?;
        Ok(Some(unwrap_envelope(value)))
    }

    /// Send one frame carrying `payload`
    pub async fn send(&mut self, payload: &Value) -> Result<()> {
        let mut bytes = serde_json::to_vec(&json!({ "data": payload }))?;
        bytes.push(SENTINEL);
        self.stream.write_all(&bytes).await?;
        Ok(())
    }
}

/// Strip a bare `{"data": v}` envelope, leaving any other shape untouched
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    async fn round_trip(payload: Value) -> Value {
        let (client, server) = tokio::io::duplex(4096);
        let mut tx = FrameStream::new(client);
        let mut rx = FrameStream::new(server);
        tx.send(&payload).await.expect("send should succeed");
        rx.recv()
            .await
            .expect("recv should succeed")
            .expect("frame expected")
    }

    #[rstest]
    #[case(json!({"key": 12, "data": 12}))]
    #[case(json!({"cmd": "ping"}))]
    #[case(json!({"status": false, "msg": "No available servers."}))]
    #[case(json!([1, 2, 3]))]
    #[case(json!("text with ; inside"))]
    #[case(json!(null))]
    #[tokio::test]
    async fn frame_round_trip_is_identity(#[case] payload: Value) {
        assert_eq!(round_trip(payload.clone()).await, payload);
    }

    #[tokio::test]
    async fn frame_larger_than_one_chunk_round_trips() {
        let payload = json!({"data_blob": "x".repeat(5000)});
        assert_eq!(round_trip(payload.clone()).await, payload);
    }

    #[tokio::test]
    async fn recv_returns_none_on_clean_eof() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let mut rx = FrameStream::new(server);
        assert!(rx.recv().await.expect("clean EOF is not an error").is_none());
    }

    #[tokio::test]
    async fn recv_fails_on_mid_frame_eof() {
        let (mut client, server) = tokio::io::duplex(64);
        client
            .write_all(b"{\"cmd\":")
            .await
            .expect("write should succeed");
        drop(client);
        let mut rx = FrameStream::new(server);
        assert!(matches!(rx.recv().await, Err(WireError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn recv_fails_on_invalid_json() {
        let (mut client, server) = tokio::io::duplex(64);
        client
            .write_all(b"not json;")
            .await
            .expect("write should succeed");
        let mut rx = FrameStream::new(server);
        assert!(matches!(rx.recv().await, Err(WireError::Protocol(_))));
    }

    #[tokio::test]
    async fn recv_accepts_unwrapped_frames_from_legacy_peers() {
        let (mut client, server) = tokio::io::duplex(64);
        client
            .write_all(b"{\"cmd\":\"ping\"};")
            .await
            .expect("write should succeed");
        let mut rx = FrameStream::new(server);
        let value = rx
            .recv()
            .await
            .expect("recv should succeed")
            .expect("frame expected");
        assert_eq!(value, json!({"cmd": "ping"}));
    }
}
