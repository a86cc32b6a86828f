//! Two-player arcade duel: ships, patrolling enemies, collectable stars and
//! shots on a fixed 785×560 playfield.
//!
//! Everything here is pure game logic. Terminal I/O, key bindings and the
//! frame clock live in the binary.

pub mod audio;
pub mod collision;
pub mod config;
pub mod entities;
pub mod error;
pub mod input;
pub mod persistence;
pub mod projectile;
pub mod render;
pub mod session;
pub mod vector;
