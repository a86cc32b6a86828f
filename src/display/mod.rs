/// Rendering layer: all terminal I/O lives here.
///
/// `TerminalCanvas` implements `RenderTarget`: the session hands it visuals
/// in playfield units and it scales them onto whatever terminal size we have.
/// No game logic is performed here.

use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use twin_duel::config::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use twin_duel::entities::{GameStatus, Orientation, PlayerId, Side, Winner};
use twin_duel::render::{RenderTarget, Scoreboard, Visual};
use twin_duel::vector::Vec2;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_BACKDROP: Color = Color::DarkGrey;
const C_PLAYER_1: Color = Color::White;
const C_PLAYER_2: Color = Color::Cyan;
const C_ENEMY: Color = Color::Green;
const C_STAR: Color = Color::Yellow;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_EXPLOSION: Color = Color::Red;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_SCORE: Color = Color::Yellow;
const C_NOTICE: Color = Color::Green;
const C_HINT: Color = Color::DarkGrey;

/// Explosion glyphs from flash to smoke.
const EXPLOSION_FRAMES: [&str; 5] = ["✺", "✹", "✸", "*", "·"];

/// Number of backdrop dots in the scrolling starfield.
const BACKDROP_DOTS: u32 = 40;

const CONTROLS: &str =
    "P1 ←↑↓→ B fire O turn   P2 WASD V fire R turn   K save  L load  Q quit";

pub struct TerminalCanvas<'a, W: Write> {
    out: &'a mut W,
    width: u16,
    height: u16,
    /// One-line message shown in the HUD, e.g. "Game saved".
    notice: Option<&'a str>,
}

impl<'a, W: Write> TerminalCanvas<'a, W> {
    pub fn new(out: &'a mut W, width: u16, height: u16) -> Self {
        Self { out, width, height, notice: None }
    }

    pub fn with_notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    /// Playfield units → terminal cell inside the border, or `None` when the
    /// point is off-screen.
    fn cell(&self, at: Vec2) -> Option<(u16, u16)> {
        let inner_w = self.width.saturating_sub(2) as f32;
        let inner_h = self.height.saturating_sub(4) as f32;
        if inner_w < 1.0 || inner_h < 1.0 {
            return None;
        }
        let col = at.x / PLAYFIELD_WIDTH * inner_w;
        let row = at.y / PLAYFIELD_HEIGHT * inner_h;
        if !(0.0..inner_w).contains(&col) || !(0.0..inner_h).contains(&row) {
            return None;
        }
        Some((1 + col as u16, 2 + row as u16))
    }

    /// Print `glyph` centred on `at`, clipped to the play area.
    fn put(&mut self, at: Vec2, glyph: &str, color: Color) -> io::Result<()> {
        let Some((col, row)) = self.cell(at) else {
            return Ok(());
        };
        let len = glyph.chars().count() as u16;
        let col = col.saturating_sub(len / 2).max(1);
        let room = self.width.saturating_sub(1).saturating_sub(col) as usize;
        let clipped: String = glyph.chars().take(room).collect();
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out.queue(style::SetForegroundColor(color))?;
        self.out.queue(Print(clipped))?;
        Ok(())
    }

    // ── Border ────────────────────────────────────────────────────────────────

    fn draw_border(&mut self) -> io::Result<()> {
        let w = self.width as usize;
        let h = self.height;

        self.out.queue(style::SetForegroundColor(C_BORDER))?;

        // Row 1: top bar
        self.out.queue(cursor::MoveTo(0, 1))?;
        self.out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

        // Row h-2: bottom bar
        self.out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
        self.out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

        // Side walls
        for row in 2..h.saturating_sub(2) {
            self.out.queue(cursor::MoveTo(0, row))?;
            self.out.queue(Print("│"))?;
            self.out.queue(cursor::MoveTo(self.width.saturating_sub(1), row))?;
            self.out.queue(Print("│"))?;
        }

        Ok(())
    }

    // ── Backdrop ──────────────────────────────────────────────────────────────

    /// Fixed dot pattern shifted down by the scroll offset and wrapped.
    fn draw_backdrop(&mut self, offset: f32) -> io::Result<()> {
        for i in 0..BACKDROP_DOTS {
            let seed = i.wrapping_mul(2_654_435_761);
            let x = (seed % 997) as f32 / 997.0 * PLAYFIELD_WIDTH;
            let y = ((seed / 997) % 991) as f32 / 991.0 * PLAYFIELD_HEIGHT;
            let y = (y + PLAYFIELD_HEIGHT - offset).rem_euclid(PLAYFIELD_HEIGHT);
            self.put(Vec2::new(x, y), "·", C_BACKDROP)?;
        }
        Ok(())
    }

    // ── HUD (row 0) ───────────────────────────────────────────────────────────

    fn draw_hud(&mut self, board: &Scoreboard) -> io::Result<()> {
        for (i, color) in [(0usize, C_PLAYER_1), (1, C_PLAYER_2)] {
            let label = format!("P{} ", i + 1);
            let lives = format!("♥{:<3}", board.lives[i].max(0));
            let score = format!(" Score:{:>4}", board.scores[i]);
            let len = (label.chars().count() + lives.chars().count() + score.chars().count()) as u16;
            let col = if i == 0 { 1 } else { self.width.saturating_sub(len + 1) };

            self.out.queue(cursor::MoveTo(col, 0))?;
            self.out.queue(style::SetForegroundColor(color))?;
            self.out.queue(Print(label))?;
            self.out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
            self.out.queue(Print(lives))?;
            self.out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
            self.out.queue(Print(score))?;
        }

        if let Some(notice) = self.notice {
            let col = (self.width / 2).saturating_sub(notice.chars().count() as u16 / 2);
            self.out.queue(cursor::MoveTo(col, 0))?;
            self.out.queue(style::SetForegroundColor(C_NOTICE))?;
            self.out.queue(Print(notice))?;
        }
        Ok(())
    }

    // ── Controls hint (last row) ──────────────────────────────────────────────

    fn draw_controls_hint(&mut self) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(1, self.height.saturating_sub(1)))?;
        self.out.queue(style::SetForegroundColor(C_HINT))?;
        let room = self.width.saturating_sub(2) as usize;
        self.out.queue(Print(CONTROLS.chars().take(room).collect::<String>()))?;
        Ok(())
    }

    // ── Game-over overlay ─────────────────────────────────────────────────────

    fn draw_game_over(&mut self, winner: Winner, board: &Scoreboard) -> io::Result<()> {
        let verdict = match winner {
            Winner::Player1 => "First Player Wins",
            Winner::Player2 => "Second Player Wins",
            Winner::Tie => "Tie",
        };
        let score_line = format!("{} : {}", board.scores[0], board.scores[1]);

        let lines: [(&str, Color); 3] = [
            ("╔════════════════════╗", Color::Red),
            ("║    GAME  OVER      ║", Color::Red),
            ("╚════════════════════╝", Color::Red),
        ];
        let cx = self.width / 2;
        let start_row = (self.height / 2).saturating_sub(3);

        for (i, (msg, color)) in lines.iter().enumerate() {
            let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
            self.out.queue(cursor::MoveTo(col, start_row + i as u16))?;
            self.out.queue(style::SetForegroundColor(*color))?;
            self.out.queue(Print(*msg))?;
        }

        let tail: [(&str, Color); 3] = [
            (verdict, Color::Yellow),
            (score_line.as_str(), Color::White),
            ("Enter - Play Again  Q - Quit", Color::White),
        ];
        for (i, (msg, color)) in tail.iter().enumerate() {
            let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
            let row = start_row + lines.len() as u16 + i as u16;
            self.out.queue(cursor::MoveTo(col, row))?;
            self.out.queue(style::SetForegroundColor(*color))?;
            self.out.queue(Print(*msg))?;
        }
        Ok(())
    }
}

fn player_glyph(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Forward => "/▲\\",
        Orientation::Backward => "\\▼/",
        Orientation::Left => "◄■=",
        Orientation::Right => "=■►",
    }
}

impl<W: Write> RenderTarget for TerminalCanvas<'_, W> {
    type Error = io::Error;

    fn reset_frame(&mut self) -> io::Result<()> {
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.draw_border()
    }

    fn draw(&mut self, visual: Visual, at: Vec2) -> io::Result<()> {
        match visual {
            Visual::Background => self.draw_backdrop(at.y),
            Visual::Player { id, orientation } => {
                let color = match id {
                    PlayerId::One => C_PLAYER_1,
                    PlayerId::Two => C_PLAYER_2,
                };
                self.put(at, player_glyph(orientation), color)
            }
            Visual::Enemy => self.put(at, "«▼»", C_ENEMY),
            Visual::Star => self.put(at, "★", C_STAR),
            Visual::Projectile { owner: Side::Enemy } => self.put(at, "↓", C_BULLET_ENEMY),
            Visual::Projectile { .. } => self.put(at, "║", C_BULLET_PLAYER),
            Visual::Explosion { frame, frame_count } => {
                let step = (frame as usize * EXPLOSION_FRAMES.len()) / frame_count.max(1) as usize;
                let glyph = EXPLOSION_FRAMES[step.min(EXPLOSION_FRAMES.len() - 1)];
                self.put(at, glyph, C_EXPLOSION)
            }
        }
    }

    fn draw_status(&mut self, board: &Scoreboard) -> io::Result<()> {
        self.draw_hud(board)?;
        self.draw_controls_hint()?;
        if let GameStatus::GameOver(winner) = board.status {
            self.draw_game_over(winner, board)?;
        }
        Ok(())
    }

    fn present_frame(&mut self) -> io::Result<()> {
        // Park cursor in a harmless spot and flush
        self.out.queue(style::ResetColor)?;
        self.out.queue(cursor::MoveTo(0, self.height.saturating_sub(1)))?;
        self.out.flush()
    }
}
