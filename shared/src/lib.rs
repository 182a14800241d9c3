use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod protocol;

pub use protocol::{
    encode_frame, read_packet, write_frame, write_packet, FrameError, Packet, MAX_FRAME_LEN,
    SESSION_FULL_REASON,
};

pub const DEFAULT_PORT: u16 = 12345;

pub const BOARD_WIDTH: f64 = 800.0;
pub const BOARD_HEIGHT: f64 = 600.0;
pub const GROUND_Y: i32 = 530;

pub const TANK_Y: i32 = 515;
pub const TANK_WIDTH: i32 = 25;
pub const TANK_HEIGHT: i32 = 15;
pub const TANK_STEP: i32 = 2;
pub const TANK_MAX_X: i32 = 750;
pub const PLAYER1_START_X: i32 = 100;
pub const PLAYER2_START_X: i32 = 600;
pub const DEFAULT_ANGLE: i32 = 45;
pub const MIN_ANGLE: i32 = 0;
pub const MAX_ANGLE: i32 = 180;
pub const ANGLE_STEP: i32 = 5;
pub const MAX_HP: i32 = 100;
pub const MAX_FUEL: i32 = 100;

pub const PROJECTILE_DIAMETER: i32 = 10;
pub const MUZZLE_SPEED: f64 = 10.0;
pub const GRAVITY: f64 = 0.2;
pub const HIT_DAMAGE: i32 = 20;

pub const OBSTACLE_MIN_COUNT: usize = 3;
pub const OBSTACLE_MAX_COUNT: usize = 6;
pub const OBSTACLE_MAX_X: i32 = 750;
pub const OBSTACLE_MIN_WIDTH: i32 = 20;
pub const OBSTACLE_MAX_WIDTH: i32 = 50;
pub const OBSTACLE_HEIGHT: i32 = 20;
pub const OBSTACLE_CLEARANCE: i32 = 50;

/// One of the two player identities inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    PlayerOne,
    PlayerTwo,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::PlayerOne, Slot::PlayerTwo];

    pub fn from_is_player1(is_player1: bool) -> Self {
        if is_player1 {
            Slot::PlayerOne
        } else {
            Slot::PlayerTwo
        }
    }

    pub fn is_player1(self) -> bool {
        self == Slot::PlayerOne
    }

    pub fn opponent(self) -> Self {
        match self {
            Slot::PlayerOne => Slot::PlayerTwo,
            Slot::PlayerTwo => Slot::PlayerOne,
        }
    }

    pub fn starting_x(self) -> i32 {
        match self {
            Slot::PlayerOne => PLAYER1_START_X,
            Slot::PlayerTwo => PLAYER2_START_X,
        }
    }

    pub fn color(self) -> TankColor {
        match self {
            Slot::PlayerOne => TankColor::Blue,
            Slot::PlayerTwo => TankColor::Red,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::PlayerOne => write!(f, "player 1"),
            Slot::PlayerTwo => write!(f, "player 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankColor {
    Blue,
    Red,
}

/// Axis-aligned integer rectangle, `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Touching edges do not count as an overlap, and empty rectangles never overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width <= 0 || self.height <= 0 || other.width <= 0 || other.height <= 0 {
            return false;
        }

        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tank {
    pub x: i32,
    pub y: i32,
    pub color: TankColor,
    pub angle: i32,
    pub hp: i32,
    pub fuel: i32,
}

impl Tank {
    pub fn new(x: i32, y: i32, color: TankColor) -> Self {
        Self {
            x,
            y,
            color,
            angle: DEFAULT_ANGLE,
            hp: MAX_HP,
            fuel: MAX_FUEL,
        }
    }

    pub fn starting(slot: Slot) -> Self {
        Self::new(slot.starting_x(), TANK_Y, slot.color())
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, TANK_WIDTH, TANK_HEIGHT)
    }

    pub fn moved_left(&self, obstacles: &[Obstacle]) -> Self {
        self.moved_by(-TANK_STEP, obstacles)
    }

    pub fn moved_right(&self, obstacles: &[Obstacle]) -> Self {
        self.moved_by(TANK_STEP, obstacles)
    }

    // Every successful step burns one unit of fuel.
    fn moved_by(&self, dx: i32, obstacles: &[Obstacle]) -> Self {
        let within_board = if dx < 0 {
            self.x > 0
        } else {
            self.x < TANK_MAX_X
        };
        let target_x = self.x + dx;

        if !within_board || self.fuel <= 0 || self.collides_at(target_x, obstacles) {
            return *self;
        }

        Self {
            x: target_x,
            fuel: (self.fuel - 1).max(0),
            ..*self
        }
    }

    fn collides_at(&self, x: i32, obstacles: &[Obstacle]) -> bool {
        let bounds = Rect::new(x, self.y, TANK_WIDTH, TANK_HEIGHT);
        obstacles
            .iter()
            .any(|obstacle| bounds.intersects(&obstacle.bounds()))
    }

    pub fn with_angle_delta(&self, delta: i32) -> Self {
        Self {
            angle: (self.angle + delta).clamp(MIN_ANGLE, MAX_ANGLE),
            ..*self
        }
    }

    pub fn damaged(&self, amount: i32) -> Self {
        Self {
            hp: (self.hp - amount).max(0),
            ..*self
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

/// Immovable block standing on the ground line; `y` is the ground-relative base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Obstacle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y - self.height, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub owner: Slot,
    pub visible: bool,
}

impl Projectile {
    /// Spawns a shot at the barrel of `tank`, travelling along its current angle.
    pub fn fire(tank: &Tank, owner: Slot) -> Self {
        let muzzle_x = tank.x + TANK_WIDTH / 2;
        let radians = (tank.angle as f64).to_radians();

        Self {
            x: muzzle_x as f64 - PROJECTILE_DIAMETER as f64 / 2.0,
            y: tank.y as f64,
            dx: MUZZLE_SPEED * radians.cos(),
            dy: -MUZZLE_SPEED * radians.sin(),
            owner,
            visible: true,
        }
    }

    /// Integrates one frame of flight.
    pub fn advanced(&self) -> Self {
        let x = self.x + self.dx;
        let y = self.y + self.dy;

        let grounded = y + PROJECTILE_DIAMETER as f64 >= GROUND_Y as f64;
        let off_board = y > BOARD_HEIGHT || x < 0.0 || x > BOARD_WIDTH;

        Self {
            x,
            y,
            dy: self.dy + GRAVITY,
            visible: self.visible && !grounded && !off_board,
            ..*self
        }
    }

    pub fn hidden(&self) -> Self {
        Self {
            visible: false,
            ..*self
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            PROJECTILE_DIAMETER,
            PROJECTILE_DIAMETER,
        )
    }
}

/// Complete description of one match at an instant. Every operation returns a
/// new snapshot; a snapshot that has been transmitted is never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub player1_tank: Tank,
    pub player2_tank: Tank,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub player1_turn: bool,
}

impl GameSnapshot {
    pub fn new_match(obstacles: Vec<Obstacle>) -> Self {
        Self {
            player1_tank: Tank::starting(Slot::PlayerOne),
            player2_tank: Tank::starting(Slot::PlayerTwo),
            projectiles: Vec::new(),
            obstacles,
            player1_turn: true,
        }
    }

    pub fn tank(&self, slot: Slot) -> &Tank {
        match slot {
            Slot::PlayerOne => &self.player1_tank,
            Slot::PlayerTwo => &self.player2_tank,
        }
    }

    pub fn with_tank(&self, slot: Slot, tank: Tank) -> Self {
        let mut next = self.clone();
        match slot {
            Slot::PlayerOne => next.player1_tank = tank,
            Slot::PlayerTwo => next.player2_tank = tank,
        }
        next
    }

    pub fn turn(&self) -> Slot {
        Slot::from_is_player1(self.player1_turn)
    }

    pub fn is_turn_of(&self, slot: Slot) -> bool {
        self.turn() == slot
    }

    pub fn fired(&self, slot: Slot) -> Self {
        let mut next = self.clone();
        next.projectiles.push(Projectile::fire(self.tank(slot), slot));
        next
    }

    /// Advances every projectile one frame, applies hits and drops spent shots.
    pub fn stepped(&self) -> Self {
        let mut player1_tank = self.player1_tank;
        let mut player2_tank = self.player2_tank;
        let mut projectiles = Vec::with_capacity(self.projectiles.len());

        for projectile in &self.projectiles {
            let mut projectile = projectile.advanced();

            if projectile.visible {
                let bounds = projectile.bounds();
                let target = match projectile.owner {
                    Slot::PlayerOne => &mut player2_tank,
                    Slot::PlayerTwo => &mut player1_tank,
                };

                if bounds.intersects(&target.bounds()) {
                    *target = target.damaged(HIT_DAMAGE);
                    projectile = projectile.hidden();
                } else if self
                    .obstacles
                    .iter()
                    .any(|obstacle| bounds.intersects(&obstacle.bounds()))
                {
                    projectile = projectile.hidden();
                }
            }

            if projectile.visible {
                projectiles.push(projectile);
            }
        }

        Self {
            player1_tank,
            player2_tank,
            projectiles,
            obstacles: self.obstacles.clone(),
            player1_turn: self.player1_turn,
        }
    }

    pub fn shot_resolved(&self, slot: Slot) -> bool {
        !self
            .projectiles
            .iter()
            .any(|projectile| projectile.owner == slot && projectile.visible)
    }

    pub fn turn_passed(&self) -> Self {
        Self {
            player1_turn: !self.player1_turn,
            ..self.clone()
        }
    }

    pub fn winner(&self) -> Option<Slot> {
        if self.player1_tank.is_destroyed() {
            Some(Slot::PlayerTwo)
        } else if self.player2_tank.is_destroyed() {
            Some(Slot::PlayerOne)
        } else {
            None
        }
    }
}

/// Lays out a fresh set of obstacles, keeping every one clear of both spawn points.
pub fn generate_obstacles<R: Rng + ?Sized>(rng: &mut R) -> Vec<Obstacle> {
    let count = rng.gen_range(OBSTACLE_MIN_COUNT..=OBSTACLE_MAX_COUNT);

    (0..count)
        .map(|_| {
            let x = loop {
                let candidate = rng.gen_range(0..OBSTACLE_MAX_X);
                if is_clear_of_spawns(candidate) {
                    break candidate;
                }
            };
            let width = rng.gen_range(OBSTACLE_MIN_WIDTH..OBSTACLE_MAX_WIDTH);
            Obstacle::new(x, GROUND_Y, width, OBSTACLE_HEIGHT)
        })
        .collect()
}

fn is_clear_of_spawns(x: i32) -> bool {
    Slot::ALL
        .iter()
        .all(|slot| (x - slot.starting_x()).abs() >= OBSTACLE_CLEARANCE)
}
