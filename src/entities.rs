/// Ships, enemies and stars: one `Entity` type tagged by `EntityKind`, plus
/// the explosion state machine it shares with projectiles.

use std::fmt;

use tracing::trace;

use crate::audio::{AudioSink, Cue};
use crate::collision::{Bounded, Rect};
use crate::config::{
    ENEMY_PATROL_RIGHT, ENEMY_SIZE, ENGINE_CABIN_INTERVAL, ENGINE_START_SPEED, ENGINE_STOP_SPEED,
    PLAYER_SIZE, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, STAR_DRIFT_RIGHT, STAR_SIZE, THRUST,
};
use crate::input::DirectionFlags;
use crate::render::Visual;
use crate::vector::Vec2;

// ── Identity ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

/// Which side a projectile was fired by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Player1,
    Player2,
    Enemy,
}

impl Side {
    pub fn player(self) -> Option<PlayerId> {
        match self {
            Side::Player1 => Some(PlayerId::One),
            Side::Player2 => Some(PlayerId::Two),
            Side::Enemy => None,
        }
    }
}

impl From<PlayerId> for Side {
    fn from(id: PlayerId) -> Self {
        match id {
            PlayerId::One => Side::Player1,
            PlayerId::Two => Side::Player2,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player1 => write!(f, "player 1"),
            Side::Player2 => write!(f, "player 2"),
            Side::Enemy => write!(f, "enemy"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winner {
    Player1,
    Player2,
    Tie,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    GameOver(Winner),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Player(PlayerId),
    Enemy,
    Star,
}

/// Facing of a player ship. Purely visual; the renderer picks the glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Forward,
    Left,
    Backward,
    Right,
}

impl Orientation {
    /// Next facing when the rotate key is pressed.
    pub fn rotated(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Left,
            Orientation::Left => Orientation::Backward,
            Orientation::Backward => Orientation::Right,
            Orientation::Right => Orientation::Forward,
        }
    }
}

// ── Explosion animation ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplosionState {
    Idle,
    Exploding { frame: u32 },
}

/// Frame counter for an impact/death animation, drawn where it started.
#[derive(Clone, Debug, PartialEq)]
pub struct Explosion {
    state: ExplosionState,
    frame_count: u32,
    origin: Vec2,
}

impl Explosion {
    pub fn new(frame_count: u32) -> Self {
        Self {
            state: ExplosionState::Idle,
            frame_count: frame_count.max(1),
            origin: Vec2::ZERO,
        }
    }

    /// Start (or restart) the animation at `origin`.
    pub fn trigger(&mut self, origin: Vec2) {
        self.state = ExplosionState::Exploding { frame: 0 };
        self.origin = origin;
    }

    /// Returns `false` on the call that finishes the animation, `true`
    /// otherwise, including when nothing is playing.
    pub fn advance(&mut self) -> bool {
        let ExplosionState::Exploding { frame } = self.state else {
            return true;
        };
        let next = frame + 1;
        if next >= self.frame_count {
            self.state = ExplosionState::Idle;
            false
        } else {
            self.state = ExplosionState::Exploding { frame: next };
            true
        }
    }

    pub fn state(&self) -> ExplosionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ExplosionState::Exploding { .. })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Force back to idle; used when clamping a corrupted state.
    pub fn reset(&mut self) {
        self.state = ExplosionState::Idle;
    }

    pub(crate) fn overrun(&self) -> Option<u32> {
        match self.state {
            ExplosionState::Exploding { frame } if frame >= self.frame_count => Some(frame),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: ExplosionState) {
        self.state = state;
    }

    pub fn visual(&self) -> Option<(Visual, Vec2)> {
        match self.state {
            ExplosionState::Exploding { frame } => Some((
                Visual::Explosion { frame, frame_count: self.frame_count },
                self.origin,
            )),
            ExplosionState::Idle => None,
        }
    }
}

/// Anything that plays an explosion; lets the session advance every
/// animation in one pass.
pub trait Animated {
    fn is_exploding(&self) -> bool;
    fn advance_explosion(&mut self) -> bool;
    fn explosion_mut(&mut self) -> &mut Explosion;
}

// ── Engine sound FSM ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

// ── Entity ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Entity {
    kind: EntityKind,
    position: Vec2,
    velocity: Vec2,
    /// Per-frame self-propulsion for enemies (x only) and stars.
    drift: Vec2,
    lives: i32,
    score: u32,
    orientation: Orientation,
    explosion: Explosion,
    engine: EngineState,
    engine_timer: f32,
}

impl Entity {
    fn new(kind: EntityKind, position: Vec2, explosion_frames: u32) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            drift: Vec2::ZERO,
            lives: 0,
            score: 0,
            orientation: Orientation::Forward,
            explosion: Explosion::new(explosion_frames),
            engine: EngineState::Stopped,
            engine_timer: 0.0,
        }
    }

    pub fn player(id: PlayerId, position: Vec2, lives: i32, explosion_frames: u32) -> Self {
        Self {
            lives,
            ..Self::new(EntityKind::Player(id), position, explosion_frames)
        }
    }

    pub fn enemy(position: Vec2, speed: f32, explosion_frames: u32) -> Self {
        Self {
            drift: Vec2::new(speed, 0.0),
            ..Self::new(EntityKind::Enemy, position, explosion_frames)
        }
    }

    pub fn star(position: Vec2, velocity: Vec2, explosion_frames: u32) -> Self {
        Self {
            drift: velocity,
            ..Self::new(EntityKind::Star, position, explosion_frames)
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn size(&self) -> Vec2 {
        match self.kind {
            EntityKind::Player(_) => PLAYER_SIZE,
            EntityKind::Enemy => ENEMY_SIZE,
            EntityKind::Star => STAR_SIZE,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn drift_velocity(&self) -> Vec2 {
        self.drift
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    // ── Movement policies ────────────────────────────────────────────────────

    /// Accelerate by `THRUST` per held direction, then keep the ship's box
    /// inside the playfield.
    pub fn move_by(&mut self, directions: DirectionFlags) {
        if directions.contains(DirectionFlags::LEFT) {
            self.velocity.x -= THRUST;
        }
        if directions.contains(DirectionFlags::RIGHT) {
            self.velocity.x += THRUST;
        }
        if directions.contains(DirectionFlags::FORWARD) {
            self.velocity.y -= THRUST;
        }
        if directions.contains(DirectionFlags::BACKWARD) {
            self.velocity.y += THRUST;
        }
        self.clamp_to_playfield();
    }

    /// Apply velocity over `dt` seconds.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        if matches!(self.kind, EntityKind::Player(_)) {
            self.clamp_to_playfield();
        }
    }

    /// Snap to the nearest bound and drop the outward velocity component.
    fn clamp_to_playfield(&mut self) {
        let half = self.size() * 0.5;
        let (min_x, max_x) = (half.x, PLAYFIELD_WIDTH - half.x);
        let (min_y, max_y) = (half.y, PLAYFIELD_HEIGHT - half.y);

        if self.position.x <= min_x {
            self.position.x = min_x;
            self.velocity.x = self.velocity.x.max(0.0);
        } else if self.position.x >= max_x {
            self.position.x = max_x;
            self.velocity.x = self.velocity.x.min(0.0);
        }

        if self.position.y <= min_y {
            self.position.y = min_y;
            self.velocity.y = self.velocity.y.max(0.0);
        } else if self.position.y >= max_y {
            self.position.y = max_y;
            self.velocity.y = self.velocity.y.min(0.0);
        }
    }

    /// Enemy behaviour: slide sideways, turning around at the lane edges.
    pub fn patrol(&mut self) {
        self.position.x += self.drift.x;
        let b = self.bounds();
        if (b.left <= 0.0 && self.drift.x < 0.0) || (b.right >= ENEMY_PATROL_RIGHT && self.drift.x > 0.0)
        {
            self.drift.x = -self.drift.x;
        }
    }

    /// Star behaviour: diagonal drift bouncing off the side edges. The
    /// vertical component only bounces when `vertical_bounce` is set.
    pub fn drift(&mut self, vertical_bounce: bool) {
        self.position += self.drift;
        let b = self.bounds();
        if (b.left <= 0.0 && self.drift.x < 0.0) || (b.right >= STAR_DRIFT_RIGHT && self.drift.x > 0.0) {
            self.drift.x = -self.drift.x;
        }
        if vertical_bounce
            && ((b.top <= 0.0 && self.drift.y < 0.0)
                || (b.bottom >= PLAYFIELD_HEIGHT && self.drift.y > 0.0))
        {
            self.drift.y = -self.drift.y;
        }
    }

    pub fn rotate(&mut self) {
        self.orientation = self.orientation.rotated();
    }

    // ── Explosion ────────────────────────────────────────────────────────────

    pub fn explode(&mut self, audio: &mut impl AudioSink) {
        self.explosion.trigger(self.position);
        audio.play_cue(Cue::Explosion);
    }

    /// `false` exactly once, when the animation completes; the ship comes
    /// out of it at rest.
    pub fn advance_explosion(&mut self) -> bool {
        if self.explosion.advance() {
            return true;
        }
        self.velocity = Vec2::ZERO;
        self.engine = EngineState::Stopped;
        self.engine_timer = 0.0;
        false
    }

    /// Come to rest: no velocity, no explosion, engine off.
    pub fn settle(&mut self) {
        self.velocity = Vec2::ZERO;
        self.explosion.reset();
        self.engine = EngineState::Stopped;
        self.engine_timer = 0.0;
    }

    pub fn is_exploding(&self) -> bool {
        self.explosion.is_active()
    }

    pub fn explosion(&self) -> &Explosion {
        &self.explosion
    }

    // ── Engine sound ─────────────────────────────────────────────────────────

    pub fn engine_state(&self) -> EngineState {
        self.engine
    }

    /// Speed-driven engine cues: spool up above 35 u/s, wind down under
    /// 25 u/s, cabin hum once a second in between.
    pub fn update_engine(&mut self, dt: f32, audio: &mut impl AudioSink) {
        let speed = self.velocity.magnitude();
        self.engine_timer += dt;
        match self.engine {
            EngineState::Stopped => {
                if speed > ENGINE_START_SPEED {
                    self.engine = EngineState::Running;
                    self.engine_timer = 0.0;
                    audio.play_cue(Cue::EngineStart);
                }
            }
            EngineState::Running => {
                if speed < ENGINE_STOP_SPEED {
                    self.engine = EngineState::Stopped;
                    self.engine_timer = 0.0;
                    audio.play_cue(Cue::EngineStop);
                } else if self.engine_timer > ENGINE_CABIN_INTERVAL {
                    self.engine_timer = 0.0;
                    audio.play_cue(Cue::EngineCabin);
                }
            }
        }
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn set_lives(&mut self, lives: i32) {
        self.lives = lives;
    }

    pub fn increase_lives(&mut self, n: i32) {
        self.lives += n;
    }

    /// Does not clamp; the session checks for zero.
    pub fn decrease_lives(&mut self) {
        self.lives -= 1;
        trace!(kind = ?self.kind, lives = self.lives, "lost a life");
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    pub fn increase_score(&mut self, n: u32) {
        self.score = self.score.saturating_add(n);
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    /// What to draw this frame: the explosion while one plays, the sprite
    /// otherwise.
    pub fn visual(&self) -> (Visual, Vec2) {
        if let Some(explosion) = self.explosion.visual() {
            return explosion;
        }
        let visual = match self.kind {
            EntityKind::Player(id) => Visual::Player { id, orientation: self.orientation },
            EntityKind::Enemy => Visual::Enemy,
            EntityKind::Star => Visual::Star,
        };
        (visual, self.position)
    }
}

impl Animated for Entity {
    fn is_exploding(&self) -> bool {
        Entity::is_exploding(self)
    }

    fn advance_explosion(&mut self) -> bool {
        Entity::advance_explosion(self)
    }

    fn explosion_mut(&mut self) -> &mut Explosion {
        &mut self.explosion
    }
}

impl Bounded for Entity {
    fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.size())
    }
}
