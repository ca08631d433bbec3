//! Pure 3x3 board logic for two-player duels.
//!
//! The board is the only game state that the rules look at. Everything
//! about players, turns and sessions lives in `duel_core`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod rules;
mod types;

pub use rules::{check_draw, check_win};
pub use types::{Board, Cell, PlaceError, SIZE, Symbol};
