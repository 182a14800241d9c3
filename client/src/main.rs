use clap::Parser;
use client::game::AutoPlayer;
use client::network::GameClient;
use log::info;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Firing elevation in degrees, measured towards the opponent
    #[arg(short = 'a', long, default_value = "45")]
    angle: i32,

    /// Movement steps taken before each shot
    #[arg(short = 'm', long, default_value = "5")]
    moves: u32,

    /// Milliseconds per simulated projectile frame, used to pace the handover
    #[arg(long, default_value = "16")]
    frame_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut client = GameClient::connect(&args.server).await?;
    let player = AutoPlayer::new(client.slot(), args.angle, args.moves);
    info!("Playing as {}", player.slot());

    while let Some(snapshot) = client.next_state().await? {
        if let Some(winner) = snapshot.winner() {
            if winner == player.slot() {
                info!("Match over, we won");
            } else {
                info!("Match over, {} won", winner);
            }
            return Ok(());
        }

        if player.should_act(&snapshot) {
            let turn = player.take_turn(&snapshot);
            client.send_update(&turn.shot).await?;

            sleep(Duration::from_millis(args.frame_ms) * turn.flight_frames as u32).await;
            info!(
                "Shot landed after {} frames, opponent hp {}",
                turn.flight_frames,
                turn.handover.tank(player.slot().opponent()).hp
            );
            client.send_update(&turn.handover).await?;
        }
    }

    info!("Server closed the connection");
    Ok(())
}
