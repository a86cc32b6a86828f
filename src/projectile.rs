/// Shots fired by players (upward) and enemies (downward).

use crate::audio::{AudioSink, Cue};
use crate::collision::{Bounded, Rect};
use crate::config::{PLAYFIELD_HEIGHT, PROJECTILE_SIZE};
use crate::entities::{Animated, Explosion, Side};
use crate::render::Visual;
use crate::vector::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
}

impl From<Side> for Heading {
    fn from(owner: Side) -> Self {
        match owner {
            Side::Player1 | Side::Player2 => Heading::Up,
            Side::Enemy => Heading::Down,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Projectile {
    position: Vec2,
    owner: Side,
    /// Units per frame along `heading`.
    speed: f32,
    alive: bool,
    explosion: Explosion,
}

impl Projectile {
    pub fn new(owner: Side, position: Vec2, speed: f32, explosion_frames: u32) -> Self {
        Self {
            position,
            owner,
            speed,
            alive: true,
            explosion: Explosion::new(explosion_frames),
        }
    }

    pub fn owner(&self) -> Side {
        self.owner
    }

    pub fn heading(&self) -> Heading {
        Heading::from(self.owner)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Still flying and able to hit something.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_exploding(&self) -> bool {
        self.explosion.is_active()
    }

    /// Gone for good: out of play and done animating.
    pub fn is_spent(&self) -> bool {
        !self.alive && !self.explosion.is_active()
    }

    /// Move one frame toward `direction`. Once the box is past the far edge
    /// the shot is marked dead instead of moving further.
    pub fn advance(&mut self, direction: Heading) {
        if !self.alive {
            return;
        }
        let b = self.bounds();
        match direction {
            Heading::Up if b.top >= 0.0 => self.position.y -= self.speed,
            Heading::Down if b.bottom <= PLAYFIELD_HEIGHT => self.position.y += self.speed,
            _ => self.alive = false,
        }
    }

    /// Consume the shot on impact and play its small explosion.
    pub fn explode(&mut self, audio: &mut impl AudioSink) {
        self.alive = false;
        self.explosion.trigger(self.position);
        audio.play_cue(Cue::Explosion);
    }

    pub fn advance_explosion(&mut self) -> bool {
        self.explosion.advance()
    }

    pub fn explosion(&self) -> &Explosion {
        &self.explosion
    }

    /// `None` once the shot is spent.
    pub fn visual(&self) -> Option<(Visual, Vec2)> {
        if let Some(explosion) = self.explosion.visual() {
            return Some(explosion);
        }
        self.alive
            .then_some((Visual::Projectile { owner: self.owner }, self.position))
    }
}

impl Animated for Projectile {
    fn is_exploding(&self) -> bool {
        Projectile::is_exploding(self)
    }

    fn advance_explosion(&mut self) -> bool {
        Projectile::advance_explosion(self)
    }

    fn explosion_mut(&mut self) -> &mut Explosion {
        &mut self.explosion
    }
}

impl Bounded for Projectile {
    fn bounds(&self) -> Rect {
        Rect::centered(self.position, PROJECTILE_SIZE)
    }
}
