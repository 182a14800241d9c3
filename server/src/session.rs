//! A single match: two player slots, the canonical snapshot and the clients
//! receiving it.
//!
//! All joins, updates and departures go through one per-session lock, so they
//! are totally ordered. Broadcasts only enqueue already-encoded frames while
//! the lock is held; the actual socket writes happen in each connection's
//! writer task.

use crate::config::ConnectionSettings;
use crate::connection::{self, ConnectionHandle};
use crate::directory::SessionDirectory;
use log::{debug, error, info, warn};
use shared::{
    encode_frame, generate_obstacles, write_packet, GameSnapshot, Packet, Slot,
    SESSION_FULL_REASON,
};
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Why a connection could not be seated in a session.
pub enum JoinError<S> {
    /// Both slots are taken; the client was told so and disconnected.
    Full,
    /// The session was torn down before the join went through. The stream is
    /// handed back untouched so the caller can pick another session.
    Retired(S),
}

impl<S> fmt::Debug for JoinError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Full => write!(f, "Full"),
            JoinError::Retired(_) => write!(f, "Retired(..)"),
        }
    }
}

impl<S> fmt::Display for JoinError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Full => write!(f, "session is full"),
            JoinError::Retired(_) => write!(f, "session has been torn down"),
        }
    }
}

/// A stream that could not be seated, handed back to the caller.
pub(crate) enum Unseated<S> {
    Full(S),
    Retired(S),
}

/// One match: the canonical snapshot, slot occupancy and connected clients.
pub struct Session {
    id: u64,
    directory: Weak<SessionDirectory>,
    settings: ConnectionSettings,
    state: Mutex<SessionState>,
}

struct SessionState {
    snapshot: GameSnapshot,
    player1_assigned: bool,
    player2_assigned: bool,
    handlers: Vec<ConnectionHandle>,
    next_handler_id: u64,
    retired: bool,
}

impl SessionState {
    fn is_full(&self) -> bool {
        self.player1_assigned && self.player2_assigned
    }

    fn claim_slot(&mut self) -> Slot {
        if !self.player1_assigned {
            self.player1_assigned = true;
            Slot::PlayerOne
        } else {
            assert!(!self.player2_assigned, "claimed a slot in a full session");
            self.player2_assigned = true;
            Slot::PlayerTwo
        }
    }

    fn broadcast_snapshot(&self, session_id: u64) {
        let frame = match encode_frame(&Packet::State(self.snapshot.clone())) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Session {}: failed to encode snapshot: {}", session_id, e);
                return;
            }
        };

        for handler in &self.handlers {
            if !handler.send(frame.clone()) {
                debug!(
                    "Session {}: {} is already disconnecting, skipped broadcast",
                    session_id, handler.slot
                );
            }
        }
    }
}

fn fresh_match() -> GameSnapshot {
    GameSnapshot::new_match(generate_obstacles(&mut rand::thread_rng()))
}

impl Session {
    pub(crate) fn new(
        id: u64,
        directory: Weak<SessionDirectory>,
        settings: ConnectionSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            directory,
            settings,
            state: Mutex::new(SessionState {
                snapshot: fresh_match(),
                player1_assigned: false,
                player2_assigned: false,
                handlers: Vec::new(),
                next_handler_id: 0,
                retired: false,
            }),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Seats a client in the first free slot (player 1 before player 2) and
    /// starts its connection tasks. The match starts, with a broadcast of the
    /// current snapshot, as soon as both slots are taken. A client arriving
    /// at a full session is sent a rejection and disconnected.
    pub async fn join<S>(self: &Arc<Self>, stream: S) -> Result<Slot, JoinError<S>>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        match self.seat(stream).await {
            Ok(slot) => Ok(slot),
            Err(Unseated::Full(stream)) => {
                self.reject(stream).await;
                Err(JoinError::Full)
            }
            Err(Unseated::Retired(stream)) => Err(JoinError::Retired(stream)),
        }
    }

    /// Like [`Session::join`], but a full session hands the stream back
    /// instead of turning the client away.
    pub(crate) async fn seat<S>(self: &Arc<Self>, stream: S) -> Result<Slot, Unseated<S>>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut state = self.state.lock().await;

        if state.retired {
            return Err(Unseated::Retired(stream));
        }
        if state.is_full() {
            return Err(Unseated::Full(stream));
        }

        let slot = state.claim_slot();
        let id = state.next_handler_id;
        state.next_handler_id += 1;

        let handle = connection::spawn(Arc::clone(self), id, slot, stream, self.settings);
        state.handlers.push(handle);
        info!("Session {}: {} joined", self.id, slot);

        if state.is_full() {
            info!("Session {} is full, starting the match", self.id);
            state.broadcast_snapshot(self.id);
        }

        Ok(slot)
    }

    async fn reject<S>(&self, mut stream: S)
    where
        S: AsyncWrite + Unpin,
    {
        info!("Session {}: rejecting client, both slots taken", self.id);

        let packet = Packet::Rejected {
            reason: SESSION_FULL_REASON.to_string(),
        };
        match timeout(self.settings.send_timeout, write_packet(&mut stream, &packet)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Session {}: failed to send rejection: {}", self.id, e),
            Err(_) => warn!("Session {}: rejection timed out", self.id),
        }
        let _ = timeout(self.settings.send_timeout, stream.shutdown()).await;
    }

    /// Replaces the snapshot wholesale with the client's version and
    /// rebroadcasts it to everyone, the sender included. The last update
    /// processed wins; nothing is merged or validated.
    pub async fn apply_update(&self, from: Slot, snapshot: GameSnapshot) {
        let mut state = self.state.lock().await;

        if state.retired {
            debug!(
                "Session {}: dropped update from {} after teardown",
                self.id, from
            );
            return;
        }

        if let Some(winner) = snapshot.winner() {
            if state.snapshot.winner().is_none() {
                info!("Session {}: {} wins the match", self.id, winner);
            }
        }

        state.snapshot = snapshot;
        state.broadcast_snapshot(self.id);
    }

    /// Called exactly once by every connection when it ends.
    ///
    /// The first departure tears the session down: the snapshot is reset to a
    /// fresh match with new obstacles, the reset is broadcast to whoever is
    /// still connected, remaining clients are released (their writers flush
    /// the reset and hang up) and the session leaves the directory. Later
    /// departures from those released clients are no-ops.
    pub async fn leave(&self, handler_id: u64) {
        {
            let mut state = self.state.lock().await;

            if state.retired {
                debug!(
                    "Session {}: handler {} left after teardown",
                    self.id, handler_id
                );
                return;
            }

            let position = state
                .handlers
                .iter()
                .position(|handler| handler.id == handler_id);
            let Some(position) = position else {
                panic!(
                    "session {}: handler {} left without being registered",
                    self.id, handler_id
                );
            };

            let handler = state.handlers.remove(position);
            match handler.slot {
                Slot::PlayerOne => state.player1_assigned = false,
                Slot::PlayerTwo => state.player2_assigned = false,
            }
            info!("Session {}: {} disconnected", self.id, handler.slot);

            state.retired = true;
            state.snapshot = fresh_match();
            state.broadcast_snapshot(self.id);

            for remaining in state.handlers.drain(..) {
                info!(
                    "Session {}: releasing {} after reset",
                    self.id, remaining.slot
                );
            }
            state.player1_assigned = false;
            state.player2_assigned = false;
        }

        info!("Session {} has been reset and closed", self.id);
        if let Some(directory) = self.directory.upgrade() {
            directory.remove(self.id).await;
        }
    }

    pub async fn is_joinable(&self) -> bool {
        let state = self.state.lock().await;
        !state.retired && !state.is_full()
    }

    pub async fn is_retired(&self) -> bool {
        self.state.lock().await.retired
    }

    /// Occupancy of (player 1, player 2).
    pub async fn occupancy(&self) -> (bool, bool) {
        let state = self.state.lock().await;
        (state.player1_assigned, state.player2_assigned)
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.handlers.len()
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.state.lock().await.snapshot.clone()
    }
}
