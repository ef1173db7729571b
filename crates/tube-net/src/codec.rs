//! Length-prefixed postcard framing.
//!
//! Every message is a 4-byte big-endian length followed by the postcard
//! encoding. Both sides enforce [`MAX_FRAME_SIZE`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NetError;

/// Maximum frame size: 64 MB. Segment payloads are typically a few MB,
/// but a listing of a full node can be sizeable.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Write one framed message.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), NetError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = postcard::to_allocvec(message).map_err(|e| NetError::Encode(e.to_string()))?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(NetError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, NetError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(NetError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    postcard::from_bytes(&payload).map_err(|e| NetError::Decode(e.to_string()))
}
