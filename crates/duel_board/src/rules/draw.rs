//! Draw detection for the 3x3 board.

use crate::Board;
use tracing::instrument;

/// Checks if every cell is occupied.
///
/// Callers check for a win first: a full board whose last move
/// completed a line is a win, not a draw.
#[instrument(level = "trace", skip(board))]
pub fn check_draw(board: &Board) -> bool {
    board.cells().all(|cell| !cell.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check_win;
    use crate::{Cell, Symbol};

    const X: Cell = Cell::Mark(Symbol::X);
    const O: Cell = Cell::Mark(Symbol::O);
    const E: Cell = Cell::Empty;

    #[test]
    fn test_empty_board_not_full() {
        assert!(!check_draw(&Board::new()));
    }

    #[test]
    fn test_partial_board_not_full() {
        let board = Board::from_rows([[X, O, X], [O, X, O], [O, X, E]]);
        assert!(!check_draw(&board));
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let board = Board::from_rows([[X, O, X], [O, X, O], [O, X, O]]);
        assert!(check_draw(&board));
        assert!(!check_win(&board, Symbol::X));
        assert!(!check_win(&board, Symbol::O));
    }

    #[test]
    fn test_full_board_with_line_still_reports_full() {
        let board = Board::from_rows([[X, X, X], [O, O, X], [X, O, O]]);
        assert!(check_draw(&board));
        assert!(check_win(&board, Symbol::X));
    }
}
