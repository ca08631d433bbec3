//! Core domain types for the 3x3 board.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Width and height of the board.
pub const SIZE: usize = 3;

/// Mark a player writes on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Symbol {
    /// Assigned to the first admitted player, who also moves first.
    X,
    /// Assigned to the second admitted player.
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// A single square of the board.
///
/// Serialized as `""`, `"X"` or `"O"`, which is what browser clients
/// render directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here yet.
    #[default]
    Empty,
    /// Occupied by a symbol. Never changes afterwards.
    Mark(Symbol),
}

impl Cell {
    /// Returns true if the cell is unoccupied.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Returns the occupying symbol, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::Mark(symbol) => Some(symbol),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Cell::Empty => "",
            Cell::Mark(Symbol::X) => "X",
            Cell::Mark(Symbol::O) => "O",
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "" => Ok(Cell::Empty),
            "X" => Ok(Cell::Mark(Symbol::X)),
            "O" => Ok(Cell::Mark(Symbol::O)),
            other => Err(de::Error::invalid_value(
                Unexpected::Str(other),
                &"\"\", \"X\" or \"O\"",
            )),
        }
    }
}

/// Reason a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlaceError {
    /// Row or column is outside `0..SIZE`.
    #[display("Cell ({row}, {col}) is outside the board")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The cell already carries a mark.
    #[display("Cell ({row}, {col}) is already occupied")]
    Occupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}

/// 3x3 board addressed by `(row, col)`.
///
/// The only way to write a cell is [`Board::place`], which refuses to
/// overwrite an occupied cell, so marks are monotonic for the lifetime
/// of a board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit rows.
    pub fn from_rows(cells: [[Cell; SIZE]; SIZE]) -> Self {
        Self { cells }
    }

    /// Gets the cell at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Writes `symbol` into an empty cell.
    pub fn place(&mut self, row: usize, col: usize, symbol: Symbol) -> Result<(), PlaceError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(PlaceError::OutOfBounds { row, col })?;

        if !cell.is_empty() {
            return Err(PlaceError::Occupied { row, col });
        }

        *cell = Cell::Mark(symbol);
        Ok(())
    }

    /// Returns the rows of the board.
    pub fn rows(&self) -> &[[Cell; SIZE]; SIZE] {
        &self.cells
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().flatten().copied()
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells().filter(|c| !c.is_empty()).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let glyph = match cell {
                    Cell::Empty => ".",
                    other => other.as_str(),
                };
                f.write_str(glyph)?;
                if c + 1 < SIZE {
                    f.write_str("|")?;
                }
            }
            if r + 1 < SIZE {
                f.write_str("\n-+-+-\n")?;
            }
        }
        Ok(())
    }
}
