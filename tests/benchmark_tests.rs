//! Performance benchmarks for the game rules and the wire codec

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{encode_frame, generate_obstacles, read_packet, GameSnapshot, Packet, Slot};
use std::time::Instant;

fn busy_snapshot() -> GameSnapshot {
    let mut rng = StdRng::seed_from_u64(42);
    let mut snapshot = GameSnapshot::new_match(generate_obstacles(&mut rng));
    for _ in 0..8 {
        snapshot = snapshot.fired(Slot::PlayerOne).fired(Slot::PlayerTwo);
    }
    snapshot
}

/// Benchmarks one frame of projectile simulation
#[test]
fn benchmark_snapshot_step() {
    let snapshot = busy_snapshot();

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = snapshot.stepped();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot step: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks a full shot from firing until it resolves
#[test]
fn benchmark_full_flight() {
    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut snapshot = GameSnapshot::new_match(Vec::new()).fired(Slot::PlayerOne);
        while !snapshot.shot_resolved(Slot::PlayerOne) {
            snapshot = snapshot.stepped();
        }
    }

    let duration = start.elapsed();
    println!(
        "Full flight: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks obstacle layout generation
#[test]
fn benchmark_obstacle_generation() {
    let mut rng = StdRng::seed_from_u64(7);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let obstacles = generate_obstacles(&mut rng);
        assert!(!obstacles.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Obstacle generation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks encoding and decoding of state frames
#[tokio::test]
async fn benchmark_frame_codec() {
    let packet = Packet::State(busy_snapshot());

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let frame = encode_frame(&packet).unwrap();
        let mut reader = &frame[..];
        let decoded = read_packet(&mut reader).await.unwrap();
        assert!(decoded.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Frame codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
