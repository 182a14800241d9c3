use log::{debug, info};
use shared::{read_packet, write_packet, FrameError, GameSnapshot, Packet, Slot};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server rejected the connection: {0}")]
    Rejected(String),
    #[error("server closed the connection before assigning a role")]
    HandshakeClosed,
    #[error("unexpected {0} packet from server")]
    UnexpectedPacket(&'static str),
}

/// A connection to the game server with its assigned slot.
pub struct GameClient<S = TcpStream> {
    stream: S,
    slot: Slot,
}

impl GameClient<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        info!("Connecting to {}", addr);
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream).await
    }
}

impl<S> GameClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for the role packet that the server sends on admission.
    pub async fn handshake(mut stream: S) -> Result<Self, ClientError> {
        match read_packet(&mut stream).await? {
            Some(Packet::Role { is_player1 }) => {
                let slot = Slot::from_is_player1(is_player1);
                info!("Assigned as {}", slot);
                Ok(Self { stream, slot })
            }
            Some(Packet::Rejected { reason }) => Err(ClientError::Rejected(reason)),
            Some(other) => Err(ClientError::UnexpectedPacket(other.kind())),
            None => Err(ClientError::HandshakeClosed),
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub async fn send_update(&mut self, snapshot: &GameSnapshot) -> Result<(), ClientError> {
        write_packet(&mut self.stream, &Packet::Update(snapshot.clone())).await?;
        Ok(())
    }

    /// Next snapshot broadcast by the server, or `None` once it hung up.
    pub async fn next_state(&mut self) -> Result<Option<GameSnapshot>, ClientError> {
        match read_packet(&mut self.stream).await? {
            Some(Packet::State(snapshot)) => {
                debug!("Received state, {} to move", snapshot.turn());
                Ok(Some(snapshot))
            }
            Some(other) => Err(ClientError::UnexpectedPacket(other.kind())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{encode_frame, SESSION_FULL_REASON};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_handshake_assigns_slot() {
        let role = encode_frame(&Packet::Role { is_player1: false }).unwrap();
        let stream = Builder::new().read(&role).build();

        let client = GameClient::handshake(stream).await.unwrap();
        assert_eq!(client.slot(), Slot::PlayerTwo);
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let rejected = encode_frame(&Packet::Rejected {
            reason: SESSION_FULL_REASON.to_string(),
        })
        .unwrap();
        let stream = Builder::new().read(&rejected).build();

        match GameClient::handshake(stream).await {
            Err(ClientError::Rejected(reason)) => assert_eq!(reason, SESSION_FULL_REASON),
            other => panic!("expected rejection, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_handshake_on_closed_stream() {
        let stream = Builder::new().build();
        assert!(matches!(
            GameClient::handshake(stream).await,
            Err(ClientError::HandshakeClosed)
        ));
    }

    #[tokio::test]
    async fn test_send_update_and_receive_state() {
        let snapshot = GameSnapshot::new_match(Vec::new());
        let role = encode_frame(&Packet::Role { is_player1: true }).unwrap();
        let update = encode_frame(&Packet::Update(snapshot.clone())).unwrap();
        let state = encode_frame(&Packet::State(snapshot.clone())).unwrap();
        let stream = Builder::new()
            .read(&role)
            .write(&update)
            .read(&state)
            .build();

        let mut client = GameClient::handshake(stream).await.unwrap();
        client.send_update(&snapshot).await.unwrap();
        assert_eq!(client.next_state().await.unwrap(), Some(snapshot));
        assert_eq!(client.next_state().await.unwrap(), None);
    }
}
