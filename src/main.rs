mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::Print,
    terminal, ExecutableCommand, QueueableCommand,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use display::TerminalCanvas;
use twin_duel::audio::{AudioSink, Cue};
use twin_duel::config::GameConfig;
use twin_duel::entities::GameStatus;
use twin_duel::input::{Action, InputSnapshot};
use twin_duel::session::GameSession;

#[derive(Parser, Debug)]
#[command(name = "twin_duel", about = "Two-player terminal space duel")]
struct Cli {
    /// Seed the game RNG for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Where `k` saves and `l` loads
    #[arg(long, default_value = "twin_duel.sav")]
    save_file: PathBuf,

    /// Write tracing output to this file (nothing is logged otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Frame length in milliseconds
    #[arg(long, default_value_t = 33)]
    frame_ms: u64,

    /// Starting lives for each player
    #[arg(long, default_value_t = 10)]
    lives: i32,

    /// Bounce stars off the top and bottom edges too
    #[arg(long)]
    star_bounce: bool,

    /// Ring the terminal bell on explosions
    #[arg(long)]
    bell: bool,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            frame: Duration::from_millis(self.frame_ms),
            starting_lives: self.lives,
            star_vertical_bounce: self.star_bounce,
            seed: self.seed,
            ..GameConfig::default()
        }
    }
}

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

/// How long a save/load notice stays in the HUD.
const NOTICE_FRAMES: u64 = 60;

fn action_for(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Up => Action::P1Up,
        KeyCode::Down => Action::P1Down,
        KeyCode::Left => Action::P1Left,
        KeyCode::Right => Action::P1Right,
        KeyCode::Esc => Action::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'b' => Action::P1Fire,
            'o' => Action::P1Rotate,
            'w' => Action::P2Up,
            's' => Action::P2Down,
            'a' => Action::P2Left,
            'd' => Action::P2Right,
            'v' => Action::P2Fire,
            'r' => Action::P2Rotate,
            'k' => Action::Save,
            'l' => Action::Load,
            'q' => Action::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

/// Every action whose key was seen within the last `HOLD_WINDOW` frames.
fn held_actions(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> InputSnapshot {
    let mut snapshot = InputSnapshot::new();
    for (&code, &last) in key_frame {
        if frame.saturating_sub(last) > HOLD_WINDOW {
            continue;
        }
        if let Some(action) = action_for(code) {
            snapshot.press(action);
        }
    }
    snapshot
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Logs every cue; optionally rings the bell once per frame with an explosion.
struct TerminalAudio {
    bell: bool,
    ring: bool,
}

impl TerminalAudio {
    fn take_ring(&mut self) -> bool {
        std::mem::take(&mut self.ring)
    }
}

impl AudioSink for TerminalAudio {
    fn play_cue(&mut self, cue: Cue) {
        debug!(?cue, "audio cue");
        if self.bell && cue == Cue::Explosion {
            self.ring = true;
        }
    }
}

// ── Save / load ───────────────────────────────────────────────────────────────

fn save_game(session: &GameSession, path: &Path) -> String {
    match session.save_to(path) {
        Ok(()) => "Game saved".to_string(),
        Err(err) => {
            warn!(%err, path = %path.display(), "save failed");
            "Save failed".to_string()
        }
    }
}

/// A failed load leaves the session untouched.
fn load_game(session: &mut GameSession, path: &Path) -> String {
    match session.load_from(path) {
        Ok(()) => "Game loaded".to_string(),
        Err(err) => {
            warn!(%err, path = %path.display(), "load failed");
            "Load failed".to_string()
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Input model: instead of acting on each key event individually, we maintain
/// a `key_frame` map that records the frame number of the last press/repeat
/// event for every key.  Each frame the fresh keys become an `InputSnapshot`
/// and the session applies both players' actions simultaneously.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (Ghostty, kitty, etc.): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events (OS key-repeat shows as
///   repeated `Press`).  Keys expire naturally after `HOLD_WINDOW` frames of
///   silence.
fn game_loop<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
    save_path: &Path,
    audio: &mut TerminalAudio,
) -> Result<()> {
    let mut session = GameSession::new(config.clone()).context("starting game session")?;
    let frame_len = config.frame;

    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut previous = InputSnapshot::new();
    let mut notice: Option<(String, u64)> = None;
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Enter if session.status() != GameStatus::Playing => {
                            session = GameSession::new(config.clone())
                                .context("restarting game session")?;
                            previous = InputSnapshot::new();
                            notice = None;
                        }
                        _ if action_for(code) == Some(Action::Quit) => {
                            info!(frame = session.frame(), "quit requested");
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                // Repeat: refresh timestamp so key stays "held"
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                // Release: remove key immediately (keyboard-enhancement path)
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let input = held_actions(&key_frame, frame);
        if input.pressed_since(&previous, Action::Save) {
            notice = Some((save_game(&session, save_path), frame + NOTICE_FRAMES));
        }
        if input.pressed_since(&previous, Action::Load) {
            notice = Some((load_game(&mut session, save_path), frame + NOTICE_FRAMES));
        }
        previous = input;

        session.advance_frame(&input, audio);

        if notice.as_ref().is_some_and(|(_, until)| frame > *until) {
            notice = None;
        }

        let (width, height) = terminal::size().context("reading terminal size")?;
        let text = notice.as_ref().map(|(text, _)| text.as_str());
        let mut canvas = TerminalCanvas::new(out, width, height).with_notice(text);
        session.draw(&mut canvas).context("drawing frame")?;

        if audio.take_ring() {
            out.queue(Print('\x07'))?;
            out.flush()?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_len {
            thread::sleep(frame_len - elapsed);
        }
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// The game owns the screen, so tracing only goes to a file when asked for.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = cli.game_config();
    config.validate().context("invalid game settings")?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)
        .context("entering alternate screen")?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let mut audio = TerminalAudio { bell: cli.bell, ring: false };
    let result = game_loop(&mut out, &rx, &config, &cli.save_file, &mut audio);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        warn!(error = %format!("{err:#}"), "game loop ended with an error");
    }
    result
}
