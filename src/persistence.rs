/// Save-game record: both players' lives, positions and scores as
/// whitespace-separated text, in a fixed field order.
///
/// ```text
/// <p1 lives>
/// <p2 lives>
/// <p1 x> <p1 y>
/// <p2 x> <p2 y>
/// <p1 score>
/// <p2 score>
/// ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::vector::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaveRecord {
    pub p1_lives: i32,
    pub p2_lives: i32,
    pub p1_pos: Vec2,
    pub p2_pos: Vec2,
    pub p1_score: u32,
    pub p2_score: u32,
}

impl fmt::Display for SaveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.p1_lives)?;
        writeln!(f, "{}", self.p2_lives)?;
        writeln!(f, "{} {}", self.p1_pos.x, self.p1_pos.y)?;
        writeln!(f, "{} {}", self.p2_pos.x, self.p2_pos.y)?;
        writeln!(f, "{}", self.p1_score)?;
        writeln!(f, "{}", self.p2_score)
    }
}

/// Pulls named fields off a whitespace token stream.
struct Fields<'a> {
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, PersistenceError> {
        let raw = self.tokens.next().ok_or(PersistenceError::MissingField(field))?;
        raw.parse().map_err(|_| PersistenceError::InvalidField {
            field,
            value: raw.to_string(),
        })
    }

    fn lives(&mut self, field: &'static str) -> Result<i32, PersistenceError> {
        let lives: i32 = self.next(field)?;
        if lives < 0 {
            return Err(PersistenceError::InvalidField { field, value: lives.to_string() });
        }
        Ok(lives)
    }

    fn coord(&mut self, field: &'static str) -> Result<f32, PersistenceError> {
        let v: f32 = self.next(field)?;
        if !v.is_finite() {
            return Err(PersistenceError::InvalidField { field, value: v.to_string() });
        }
        Ok(v)
    }

    fn finish(mut self) -> Result<(), PersistenceError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => Err(PersistenceError::TrailingData(extra.to_string())),
        }
    }
}

impl FromStr for SaveRecord {
    type Err = PersistenceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields { tokens: text.split_whitespace() };
        let record = SaveRecord {
            p1_lives: fields.lives("p1_lives")?,
            p2_lives: fields.lives("p2_lives")?,
            p1_pos: Vec2::new(fields.coord("p1_x")?, fields.coord("p1_y")?),
            p2_pos: Vec2::new(fields.coord("p2_x")?, fields.coord("p2_y")?),
            p1_score: fields.next("p1_score")?,
            p2_score: fields.next("p2_score")?,
        };
        fields.finish()?;
        Ok(record)
    }
}

pub fn save_to_file(path: &Path, record: &SaveRecord) -> Result<(), PersistenceError> {
    fs::write(path, record.to_string())?;
    info!(path = %path.display(), "game saved");
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<SaveRecord, PersistenceError> {
    let text = fs::read_to_string(path)?;
    let record = text.parse()?;
    debug!(path = %path.display(), ?record, "save record read");
    Ok(record)
}
