//! Length-prefixed JSON frames.
//!
//! Format: 4-byte big-endian length + JSON payload. Frames larger than
//! [`MAX_FRAME_SIZE`] are rejected before the payload is read.

use crate::ports::outbound::TransportError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted frame payload (4 MiB).
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Serialize `message` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(message).map_err(|e| TransportError::Frame(e.to_string()))?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(TransportError::Frame(format!(
            "frame too large: {} > {}",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);

    writer.write_all(&frame).await.map_err(io_error)?;
    writer.flush().await.map_err(io_error)
}

/// Read one frame and deserialize it.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await.map_err(io_error)? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::Frame(format!(
            "frame too large: {} > {}",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(io_error)?;

    serde_json::from_slice(&payload).map_err(|e| TransportError::Frame(e.to_string()))
}

fn io_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe => {
            TransportError::Closed
        }
        _ => TransportError::Io(e.to_string()),
    }
}
