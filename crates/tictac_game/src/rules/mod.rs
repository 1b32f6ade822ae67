//! Game rules for tic-tac-toe.
//!
//! Pure functions over [`Board`](crate::Board). The result of a game is never
//! stored on its own; it is always recomputed from the board it describes.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, winning_line};

use crate::{Board, Mark};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Moves remain and nobody owns a line.
    InProgress,
    /// `mark` owns every cell of `line`.
    Win {
        /// The winning mark.
        mark: Mark,
        /// The three cells of the winning line.
        line: [usize; 3],
    },
    /// Every cell is filled and no line is owned.
    Draw,
}

impl Outcome {
    /// True for wins and draws.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The outcome if it ends the game, `None` while in progress.
    pub fn terminal(self) -> Option<Self> {
        self.is_terminal().then_some(self)
    }

    /// The winning mark, if any.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Win { mark, .. } => Some(*mark),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Win { mark, line } => write!(f, "Player {} wins on {:?}", mark, line),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Evaluates `board`.
///
/// Lines are scanned in [`LINES`] order and the first fully owned line wins.
/// Otherwise a full board is a draw.
#[instrument(level = "trace")]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some((mark, line)) = winning_line(board) {
        Outcome::Win { mark, line }
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(cells: &[(usize, Mark)]) -> Board {
        cells
            .iter()
            .fold(Board::new(), |b, &(i, m)| b.apply_move(i, m).unwrap())
    }

    #[test]
    fn test_empty_board_in_progress() {
        assert_eq!(evaluate(&Board::new()), Outcome::InProgress);
    }

    #[test]
    fn test_win_reports_line() {
        let board = board_from(&[
            (0, Mark::X),
            (3, Mark::O),
            (1, Mark::X),
            (4, Mark::O),
            (2, Mark::X),
        ]);
        assert_eq!(
            evaluate(&board),
            Outcome::Win {
                mark: Mark::X,
                line: [0, 1, 2]
            }
        );
    }

    #[test]
    fn test_full_board_with_win_is_not_draw() {
        // X X X / O O X / X O O
        let board = board_from(&[
            (0, Mark::X),
            (3, Mark::O),
            (1, Mark::X),
            (4, Mark::O),
            (5, Mark::X),
            (7, Mark::O),
            (6, Mark::X),
            (8, Mark::O),
            (2, Mark::X),
        ]);
        assert!(is_full(&board));
        assert_eq!(evaluate(&board).winner(), Some(Mark::X));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Outcome::Win {
            mark: Mark::O,
            line: [2, 4, 6],
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"win","mark":"O","line":[2,4,6]}"#);
        assert_eq!(serde_json::to_string(&Outcome::Draw).unwrap(), r#"{"kind":"draw"}"#);
    }
}
