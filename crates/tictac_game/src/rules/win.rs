//! Win detection logic for tic-tac-toe.

use crate::{Board, Mark, Square};
use tracing::instrument;

/// The eight winning lines: rows, then columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the first fully owned line and its owner.
#[instrument(level = "trace")]
pub fn winning_line(board: &Board) -> Option<(Mark, [usize; 3])> {
    LINES.iter().find_map(|&[a, b, c]| match board.get(a) {
        Some(Square::Occupied(mark))
            if board.get(b) == Some(Square::Occupied(mark))
                && board.get(c) == Some(Square::Occupied(mark)) =>
        {
            Some((mark, [a, b, c]))
        }
        _ => None,
    })
}
