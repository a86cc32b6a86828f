use std::fmt;
use std::io;

use crate::entities::Side;

/// A broken gameplay invariant, detected by `GameSession::check_invariants`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    NegativeLives { side: Side, lives: i32 },
    ExplosionOverrun { frame: u32, frame_count: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeLives { side, lives } => {
                write!(f, "{side} has negative lives: {lives}")
            }
            Self::ExplosionOverrun { frame, frame_count } => write!(
                f,
                "explosion frame {frame} past the end of a {frame_count}-frame animation"
            ),
        }
    }
}

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    MissingField(&'static str),
    InvalidField { field: &'static str, value: String },
    TrailingData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "save file i/o failed: {err}"),
            Self::MissingField(field) => write!(f, "save record ends before `{field}`"),
            Self::InvalidField { field, value } => {
                write!(f, "save record field `{field}` has invalid value {value:?}")
            }
            Self::TrailingData(rest) => write!(f, "unexpected data after save record: {rest:?}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Only `Initialization` is fatal; the other two are reported and the game
/// carries on.
#[derive(Debug)]
pub enum GameError {
    Initialization(String),
    Persistence(PersistenceError),
    InvariantViolation(Violation),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialization(msg) => write!(f, "failed to initialize: {msg}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::InvariantViolation(v) => write!(f, "invariant violated: {v}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for GameError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<Violation> for GameError {
    fn from(violation: Violation) -> Self {
        Self::InvariantViolation(violation)
    }
}

impl GameError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }
}
