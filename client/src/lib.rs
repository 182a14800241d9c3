//! # Tank Game Client Library
//!
//! Headless client side of the two-player artillery game. There is no window
//! and no keyboard here: the client speaks the wire protocol and plays its
//! turns automatically, which makes it useful for exercising a server end to
//! end.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::GameClient`] wraps one TCP connection:
//! - the admission handshake (assigned slot or rejection)
//! - sending snapshot updates
//! - receiving the session's broadcasts
//!
//! ### Game Module (`game`)
//! [`game::AutoPlayer`] decides when it may act and produces the updates for
//! one turn. It uses the same rules from `shared` that every client runs, so
//! the server can simply relay whatever it is sent.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::AutoPlayer;
//! use client::network::GameClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = GameClient::connect("127.0.0.1:12345").await?;
//!     let player = AutoPlayer::new(client.slot(), 45, 5);
//!
//!     while let Some(snapshot) = client.next_state().await? {
//!         if let Some(winner) = snapshot.winner() {
//!             println!("{} wins", winner);
//!             break;
//!         }
//!         if player.should_act(&snapshot) {
//!             let turn = player.take_turn(&snapshot);
//!             client.send_update(&turn.shot).await?;
//!             client.send_update(&turn.handover).await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
