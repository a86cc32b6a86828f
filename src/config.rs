/// Game tuning: playfield geometry, start/home positions and the knobs the
/// binary exposes on its command line.

use std::time::Duration;

use crate::error::GameError;
use crate::vector::Vec2;

// ── Playfield ─────────────────────────────────────────────────────────────────

pub const PLAYFIELD_WIDTH: f32 = 785.0;
pub const PLAYFIELD_HEIGHT: f32 = 560.0;

/// Enemies turn around when their box touches either side of [0, 790].
pub const ENEMY_PATROL_RIGHT: f32 = 790.0;
/// Stars bounce horizontally inside [0, 780].
pub const STAR_DRIFT_RIGHT: f32 = 780.0;

/// Velocity added per held direction per frame.
pub const THRUST: f32 = 3.1;

// ── Sprite dimensions (bounding boxes) ───────────────────────────────────────

pub const PLAYER_SIZE: Vec2 = Vec2::new(48.0, 48.0);
pub const ENEMY_SIZE: Vec2 = Vec2::new(48.0, 40.0);
pub const STAR_SIZE: Vec2 = Vec2::new(32.0, 32.0);
pub const PROJECTILE_SIZE: Vec2 = Vec2::new(8.0, 16.0);

// ── Layout ────────────────────────────────────────────────────────────────────

pub const PLAYER_STARTS: [Vec2; 2] = [Vec2::new(100.0, 400.0), Vec2::new(300.0, 400.0)];

pub const ENEMY_STARTS: [Vec2; 3] = [
    Vec2::new(100.0, 100.0),
    Vec2::new(150.0, 150.0),
    Vec2::new(200.0, 200.0),
];

/// Where each enemy slot reappears after being shot down.
pub const ENEMY_HOMES: [Vec2; 3] = [
    Vec2::new(700.0, 100.0),
    Vec2::new(750.0, 150.0),
    Vec2::new(650.0, 200.0),
];

pub const STAR_STARTS: [Vec2; 3] = [
    Vec2::new(200.0, 350.0),
    Vec2::new(250.0, 450.0),
    Vec2::new(150.0, 500.0),
];

/// Random respawn region for players and stars: x in [100, 600), y in [100, 500).
pub const RESPAWN_MIN: Vec2 = Vec2::new(100.0, 100.0);
pub const RESPAWN_MAX: Vec2 = Vec2::new(600.0, 500.0);

// ── Background scroll ─────────────────────────────────────────────────────────

pub const BACKGROUND_STEP: f32 = 10.0;
pub const BACKGROUND_INTERVAL: Duration = Duration::from_millis(100);

// ── Engine sound thresholds (units / second) ─────────────────────────────────

pub const ENGINE_START_SPEED: f32 = 35.0;
pub const ENGINE_STOP_SPEED: f32 = 25.0;
pub const ENGINE_CABIN_INTERVAL: f32 = 1.0;

// ── Runtime configuration ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Fixed simulation step; also the session clock increment.
    pub frame: Duration,
    pub starting_lives: i32,
    pub player_fire_cooldown: Duration,
    /// Minimum gap between two shots of the same enemy.
    pub enemy_fire_interval: Duration,
    /// Upper bound of the random extra delay added to `enemy_fire_interval`.
    pub enemy_fire_jitter: Duration,
    /// Horizontal patrol speed, units per frame.
    pub enemy_speed: f32,
    /// Per-axis star drift, units per frame.
    pub star_velocity: Vec2,
    pub player_shot_speed: f32,
    pub enemy_shot_speed: f32,
    pub entity_explosion_frames: u32,
    pub projectile_explosion_frames: u32,
    /// Reflect star drift at the top/bottom edges as well.
    pub star_vertical_bounce: bool,
    /// `None` seeds the RNG from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(33),
            starting_lives: 10,
            player_fire_cooldown: Duration::from_millis(300),
            enemy_fire_interval: Duration::from_millis(2000),
            enemy_fire_jitter: Duration::from_millis(3000),
            enemy_speed: 3.0,
            star_velocity: Vec2::new(2.0, 0.5),
            player_shot_speed: 12.0,
            enemy_shot_speed: 8.0,
            entity_explosion_frames: 15,
            projectile_explosion_frames: 4,
            star_vertical_bounce: false,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.frame.is_zero() {
            return Err(GameError::Initialization("frame duration must be non-zero".into()));
        }
        if self.starting_lives <= 0 {
            return Err(GameError::Initialization(format!(
                "starting lives must be positive, got {}",
                self.starting_lives
            )));
        }
        if self.entity_explosion_frames == 0 || self.projectile_explosion_frames == 0 {
            return Err(GameError::Initialization(
                "explosion animations need at least one frame".into(),
            ));
        }
        let speeds = [
            self.enemy_speed,
            self.star_velocity.x,
            self.star_velocity.y,
            self.player_shot_speed,
            self.enemy_shot_speed,
        ];
        if speeds.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(GameError::Initialization(
                "speeds must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Frame duration in seconds, the `dt` used for velocity integration.
    pub fn dt(&self) -> f32 {
        self.frame.as_secs_f32()
    }
}
