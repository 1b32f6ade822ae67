//! Draw detection logic for tic-tac-toe.

use crate::{Board, Square};
use tracing::instrument;

/// Checks if every square is occupied.
///
/// A full board with no winning line is a draw.
#[instrument(level = "trace")]
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}
