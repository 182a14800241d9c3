//! Wire protocol shared by the server and its clients.
//!
//! Every message is a single [`Packet`] serialized with bincode and framed with a
//! 4-byte big-endian length prefix. A stream that ends exactly on a frame
//! boundary is a clean close; anything else is an error.

use crate::GameSnapshot;
use bincode::{deserialize, serialize};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 1024 * 1024;
const LENGTH_PREFIX_LEN: usize = 4;

pub const SESSION_FULL_REASON: &str = "Game is full. No more players can join.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Server -> client
    Role { is_player1: bool },
    Rejected { reason: String },
    State(GameSnapshot),

    // Client -> server
    Update(GameSnapshot),
}

impl Packet {
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Role { .. } => "role",
            Packet::Rejected { .. } => "rejected",
            Packet::State(_) => "state",
            Packet::Update(_) => "update",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed payload: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {0} bytes exceeds the frame size limit")]
    Oversized(usize),
    #[error("stream closed in the middle of a frame")]
    Truncated,
}

/// Serializes a packet into a ready-to-send frame. The result is cheap to clone,
/// so a broadcast encodes once and hands the same buffer to every recipient.
pub fn encode_frame(packet: &Packet) -> Result<Bytes, FrameError> {
    let payload = serialize(packet)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(payload.len()));
    }

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(packet)?;
    write_frame(writer, &frame).await
}

/// Reads the next packet, returning `Ok(None)` when the peer closed the stream
/// between frames.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let mut filled = 0;
    while filled < prefix.len() {
        let read = reader.read(&mut prefix[filled..]).await?;
        if read == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(FrameError::Truncated)
            };
        }
        filled += read;
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(e)
        }
    })?;

    Ok(Some(deserialize(&payload)?))
}
