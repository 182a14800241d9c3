//! Per-client connection handling.
//!
//! Each accepted client gets two tasks:
//! - a reader task running the receive loop, forwarding every decoded
//!   snapshot to its session
//! - a writer task that sends the slot role once, then drains the outbound
//!   queue filled by session broadcasts
//!
//! Whichever side fails first ends the connection, and the session is told
//! about the departure exactly once.

use crate::config::ConnectionSettings;
use crate::session::Session;
use bytes::Bytes;
use log::{debug, info, warn};
use shared::{read_packet, write_frame, write_packet, FrameError, GameSnapshot, Packet, Slot};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("no message received for {0:?}")]
    IdleTimeout(Duration),
    #[error("send did not complete within {0:?}")]
    SendTimeout(Duration),
    #[error("unexpected {0} packet from client")]
    UnexpectedPacket(&'static str),
}

/// The session's view of a connected client: its slot and the queue feeding
/// its writer task. Dropping the handle closes the queue, which makes the
/// writer flush what is pending and hang up.
#[derive(Debug)]
pub(crate) struct ConnectionHandle {
    pub id: u64,
    pub slot: Slot,
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl ConnectionHandle {
    /// Queues an encoded frame. Returns false once the writer has gone away,
    /// in which case the connection's own task is already tearing down.
    pub fn send(&self, frame: Bytes) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

/// Starts the reader and writer tasks for a freshly joined client.
pub(crate) fn spawn<S>(
    session: Arc<Session>,
    id: u64,
    slot: Slot,
    stream: S,
    settings: ConnectionSettings,
) -> ConnectionHandle
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(session, id, slot, stream, outbound_rx, settings));

    ConnectionHandle { id, slot, outbound }
}

async fn run<S>(
    session: Arc<Session>,
    id: u64,
    slot: Slot,
    stream: S,
    outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    settings: ConnectionSettings,
) where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let mut writer_task = tokio::spawn(write_loop(
        writer,
        slot,
        outbound_rx,
        settings.send_timeout,
    ));

    loop {
        tokio::select! {
            result = next_update(&mut reader, settings.idle_timeout) => match result {
                Ok(Some(snapshot)) => {
                    debug!("Session {}: update from {}", session.id(), slot);
                    session.apply_update(slot, snapshot).await;
                }
                Ok(None) => {
                    info!("Session {}: {} closed the connection", session.id(), slot);
                    break;
                }
                Err(e) => {
                    warn!("Session {}: dropping {}: {}", session.id(), slot, e);
                    break;
                }
            },
            result = &mut writer_task => {
                match result {
                    Ok(Ok(())) => debug!("Session {}: writer for {} finished", session.id(), slot),
                    Ok(Err(e)) => warn!("Session {}: failed to send to {}: {}", session.id(), slot, e),
                    Err(e) => warn!("Session {}: writer for {} panicked: {}", session.id(), slot, e),
                }
                break;
            }
        }
    }

    // Both halves are dropped on return, which closes the socket exactly once.
    writer_task.abort();
    session.leave(id).await;
}

async fn next_update<R>(
    reader: &mut R,
    idle_timeout: Option<Duration>,
) -> Result<Option<GameSnapshot>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let packet = match idle_timeout {
        Some(limit) => timeout(limit, read_packet(reader))
            .await
            .map_err(|_| ConnectionError::IdleTimeout(limit))??,
        None => read_packet(reader).await?,
    };

    match packet {
        None => Ok(None),
        Some(Packet::Update(snapshot)) => Ok(Some(snapshot)),
        Some(other) => Err(ConnectionError::UnexpectedPacket(other.kind())),
    }
}

async fn write_loop<W>(
    mut writer: W,
    slot: Slot,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    send_timeout: Duration,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let role = Packet::Role {
        is_player1: slot.is_player1(),
    };
    timeout(send_timeout, write_packet(&mut writer, &role))
        .await
        .map_err(|_| ConnectionError::SendTimeout(send_timeout))??;

    while let Some(frame) = outbound.recv().await {
        timeout(send_timeout, write_frame(&mut writer, &frame))
            .await
            .map_err(|_| ConnectionError::SendTimeout(send_timeout))??;
    }

    // The session let go of this client; tell the peer we are done.
    let _ = timeout(send_timeout, writer.shutdown()).await;
    Ok(())
}
