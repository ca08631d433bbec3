//! Win detection for the 3x3 board.

use crate::{Board, Cell, Symbol};
use tracing::instrument;

/// Every row, column and diagonal, as `(row, col)` triples.
const LINES: [[(usize, usize); 3]; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Checks whether `symbol` owns a complete row, column or diagonal.
#[instrument(level = "trace", skip(board))]
pub fn check_win(board: &Board, symbol: Symbol) -> bool {
    let mark = Some(Cell::Mark(symbol));
    LINES
        .iter()
        .any(|line| line.iter().all(|&(row, col)| board.get(row, col) == mark))
}
