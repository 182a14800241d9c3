use shared::{GameSnapshot, Slot, MAX_ANGLE};

/// Upper bound on simulated frames for one shot. A shot fired at any angle
/// lands or leaves the board long before this.
pub const MAX_FLIGHT_FRAMES: usize = 2_000;

/// The two updates a player sends for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// State right after firing, projectile still at the barrel.
    pub shot: GameSnapshot,
    /// State after the shot resolved, with the turn handed to the opponent.
    pub handover: GameSnapshot,
    pub flight_frames: usize,
}

/// Plays a turn whenever the server says it may: drive towards the opponent,
/// aim and fire, then run the flight locally and pass the turn.
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    slot: Slot,
    angle: i32,
    moves: u32,
}

impl AutoPlayer {
    /// `angle` is the elevation towards the opponent; player 2 mirrors it
    /// because it faces left.
    pub fn new(slot: Slot, angle: i32, moves: u32) -> Self {
        Self {
            slot,
            angle: angle.clamp(0, MAX_ANGLE / 2),
            moves,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn should_act(&self, snapshot: &GameSnapshot) -> bool {
        snapshot.is_turn_of(self.slot)
            && snapshot.projectiles.is_empty()
            && snapshot.winner().is_none()
    }

    fn aim(&self) -> i32 {
        match self.slot {
            Slot::PlayerOne => self.angle,
            Slot::PlayerTwo => MAX_ANGLE - self.angle,
        }
    }

    pub fn take_turn(&self, snapshot: &GameSnapshot) -> Turn {
        let mut tank = *snapshot.tank(self.slot);
        for _ in 0..self.moves {
            tank = match self.slot {
                Slot::PlayerOne => tank.moved_right(&snapshot.obstacles),
                Slot::PlayerTwo => tank.moved_left(&snapshot.obstacles),
            };
        }
        tank = tank.with_angle_delta(self.aim() - tank.angle);

        let shot = snapshot.with_tank(self.slot, tank).fired(self.slot);

        let mut flight = shot.clone();
        let mut flight_frames = 0;
        while !flight.shot_resolved(self.slot) && flight_frames < MAX_FLIGHT_FRAMES {
            flight = flight.stepped();
            flight_frames += 1;
        }
        // The turn may only pass once nothing of ours is still in the air.
        flight.projectiles.retain(|projectile| projectile.owner != self.slot);

        Turn {
            shot,
            handover: flight.turn_passed(),
            flight_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{Obstacle, Tank, GROUND_Y, MAX_FUEL, MAX_HP, OBSTACLE_HEIGHT};

    #[test]
    fn test_acts_only_on_own_quiet_turn() {
        let snapshot = GameSnapshot::new_match(Vec::new());
        let one = AutoPlayer::new(Slot::PlayerOne, 45, 0);
        let two = AutoPlayer::new(Slot::PlayerTwo, 45, 0);

        assert!(one.should_act(&snapshot));
        assert!(!two.should_act(&snapshot));
        assert!(two.should_act(&snapshot.turn_passed()));

        assert!(!one.should_act(&snapshot.fired(Slot::PlayerOne)));

        let over = snapshot.with_tank(Slot::PlayerTwo, snapshot.player2_tank.damaged(MAX_HP));
        assert!(!one.should_act(&over));
    }

    #[test]
    fn test_turn_moves_fires_and_hands_over() {
        let snapshot = GameSnapshot::new_match(Vec::new());
        let player = AutoPlayer::new(Slot::PlayerOne, 60, 3);

        let turn = player.take_turn(&snapshot);

        let tank = turn.shot.player1_tank;
        assert_eq!(tank.x, 106);
        assert_eq!(tank.fuel, MAX_FUEL - 3);
        assert_eq!(tank.angle, 60);
        assert_eq!(turn.shot.projectiles.len(), 1);
        assert_eq!(turn.shot.projectiles[0].owner, Slot::PlayerOne);
        assert!(turn.shot.player1_turn);

        assert!(turn.flight_frames > 0);
        assert!(turn.flight_frames < MAX_FLIGHT_FRAMES);
        assert!(turn.handover.projectiles.is_empty());
        assert!(turn.handover.is_turn_of(Slot::PlayerTwo));
        assert_eq!(turn.handover.obstacles, snapshot.obstacles);
    }

    #[test]
    fn test_player_two_faces_left() {
        let snapshot = GameSnapshot::new_match(Vec::new()).turn_passed();
        let player = AutoPlayer::new(Slot::PlayerTwo, 30, 2);

        let turn = player.take_turn(&snapshot);

        assert_eq!(turn.shot.player2_tank.x, 596);
        assert_eq!(turn.shot.player2_tank.angle, 150);
        assert!(turn.shot.projectiles[0].dx < 0.0);
        assert_approx_eq!(
            turn.shot.projectiles[0].dx,
            10.0 * 150f64.to_radians().cos(),
            1e-9
        );
        assert_eq!(turn.shot.player1_tank, snapshot.player1_tank);
        assert!(turn.handover.is_turn_of(Slot::PlayerOne));
    }

    #[test]
    fn test_obstacle_stops_the_drive() {
        let wall = Obstacle::new(127, GROUND_Y, 30, OBSTACLE_HEIGHT);
        let snapshot = GameSnapshot::new_match(vec![wall]);
        let player = AutoPlayer::new(Slot::PlayerOne, 45, 10);

        let turn = player.take_turn(&snapshot);
        assert_eq!(turn.shot.player1_tank.x, 102);
        assert_eq!(turn.shot.player1_tank.fuel, MAX_FUEL - 1);
    }

    #[test]
    fn test_point_blank_hit_is_applied_before_handover() {
        let snapshot = GameSnapshot::new_match(Vec::new()).with_tank(
            Slot::PlayerTwo,
            Tank {
                x: 110,
                ..Tank::starting(Slot::PlayerTwo)
            },
        );
        let player = AutoPlayer::new(Slot::PlayerOne, 0, 0);

        let turn = player.take_turn(&snapshot);
        assert_eq!(turn.handover.player2_tank.hp, MAX_HP - shared::HIT_DAMAGE);
        assert_eq!(turn.flight_frames, 1);
    }
}
