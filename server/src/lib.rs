//! # Tank Game Server Library
//!
//! This library provides the authoritative server for the two-player artillery
//! game. It pairs incoming clients into sessions, keeps one canonical snapshot
//! per session and relays every change to both players.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Every accepted client is placed in the oldest session that still has a free
//! slot. The first client of a session becomes player 1, the second player 2.
//! A session never holds more than two clients, and a new session is opened
//! as soon as every existing one is full.
//!
//! ### State Relay
//! Clients run the game rules themselves and send whole snapshots back. The
//! server does not simulate or validate anything: the last snapshot received
//! replaces the session's state and is broadcast to both players, the sender
//! included.
//!
//! ### Teardown
//! When either player disconnects the session is finished. The snapshot is
//! reset to a fresh match with new obstacles, the reset is delivered to the
//! remaining player, that player is disconnected and the session is removed.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! Each client has a reader task decoding its updates and a writer task that
//! drains an outbound queue. Broadcasts encode a snapshot once and enqueue the
//! same buffer for each recipient, so a slow client never stalls its session.
//!
//! ### Lock Ordering
//! The directory and each session are guarded by their own async mutex. The
//! directory lock may be held while a session lock is taken, never the other
//! way round.
//!
//! ### TCP Framing
//! Packets are bincode-encoded and length-prefixed, see [`shared::protocol`].
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Command line options: bind address, idle timeout and send timeout.
//!
//! ### Connection Module (`connection`)
//! Per-client reader and writer tasks plus their error type.
//!
//! ### Session Module (`session`)
//! Slot assignment, snapshot replacement, broadcasting and teardown.
//!
//! ### Directory Module (`directory`)
//! Registry of live sessions and the join retry loop.
//!
//! ### Network Module (`network`)
//! The TCP listener and accept loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     // Bind to 127.0.0.1:12345 and serve until the process is stopped
//!     let server = Server::bind(&config).await?;
//!     server.run().await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod directory;
pub mod network;
pub mod session;
