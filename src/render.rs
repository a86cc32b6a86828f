/// The drawing seam between the session and whatever shows the frame.

use std::convert::Infallible;

use crate::entities::{GameStatus, Orientation, PlayerId, Side};
use crate::vector::Vec2;

/// What to draw; the target maps each variant to its own asset or glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visual {
    /// Drawn first; the position's `y` is the scroll offset.
    Background,
    Player { id: PlayerId, orientation: Orientation },
    Enemy,
    Star,
    Projectile { owner: Side },
    Explosion { frame: u32, frame_count: u32 },
}

/// Lives/score summary drawn after the sprites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scoreboard {
    pub lives: [i32; 2],
    pub scores: [u32; 2],
    pub status: GameStatus,
}

pub trait RenderTarget {
    type Error;

    fn reset_frame(&mut self) -> Result<(), Self::Error>;

    fn draw(&mut self, visual: Visual, at: Vec2) -> Result<(), Self::Error>;

    fn draw_status(&mut self, _board: &Scoreboard) -> Result<(), Self::Error> {
        Ok(())
    }

    fn present_frame(&mut self) -> Result<(), Self::Error>;
}

/// Records draw calls instead of rendering them.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub calls: Vec<(Visual, Vec2)>,
    pub status: Option<Scoreboard>,
    pub presented: usize,
}

impl RenderTarget for DrawList {
    type Error = Infallible;

    fn reset_frame(&mut self) -> Result<(), Infallible> {
        self.calls.clear();
        self.status = None;
        Ok(())
    }

    fn draw(&mut self, visual: Visual, at: Vec2) -> Result<(), Infallible> {
        self.calls.push((visual, at));
        Ok(())
    }

    fn draw_status(&mut self, board: &Scoreboard) -> Result<(), Infallible> {
        self.status = Some(*board);
        Ok(())
    }

    fn present_frame(&mut self) -> Result<(), Infallible> {
        self.presented += 1;
        Ok(())
    }
}
