//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// A player's symbol.
///
/// The session creator always plays [`Mark::X`], which moves first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Mark {
    /// First mover.
    X,
    /// Second mover.
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A single cell of the board.
///
/// Serialized as `null`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Mark>", into = "Option<Mark>")]
pub enum Square {
    /// Nobody has played here.
    Empty,
    /// Claimed by a mark.
    Occupied(Mark),
}

impl From<Option<Mark>> for Square {
    fn from(mark: Option<Mark>) -> Self {
        mark.map_or(Square::Empty, Square::Occupied)
    }
}

impl From<Square> for Option<Mark> {
    fn from(square: Square) -> Self {
        match square {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// Why a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMove {
    /// The index is not on the board.
    #[display("Cell {} is out of range (must be 0-8)", _0)]
    OutOfRange(usize),
    /// The cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    Occupied(usize),
}

impl std::error::Error for IllegalMove {}

/// 3x3 board in row-major order (0 = top-left, 8 = bottom-right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; CELLS],
        }
    }

    /// Gets the square at `index`, or `None` when off the board.
    pub fn get(&self, index: usize) -> Option<Square> {
        self.squares.get(index).copied()
    }

    /// Checks if the cell at `index` exists and is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Square::Empty))
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; CELLS] {
        &self.squares
    }

    /// Indices of empty cells in ascending order.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELLS).filter(|&i| self.is_empty(i)).collect()
    }

    /// Number of cells claimed by `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|&&s| s == Square::Occupied(mark))
            .count()
    }

    /// Number of marks placed so far.
    pub fn marks_placed(&self) -> usize {
        CELLS - self.empty_cells().len()
    }

    /// The mark due to move under strict alternation with X first.
    pub fn next_mark(&self) -> Mark {
        if self.count(Mark::X) > self.count(Mark::O) {
            Mark::O
        } else {
            Mark::X
        }
    }

    /// Returns a copy of the board with `mark` placed at `index`.
    ///
    /// # Errors
    ///
    /// [`IllegalMove::OutOfRange`] for an index past 8 and
    /// [`IllegalMove::Occupied`] when the cell is taken. `self` is never modified.
    #[instrument(skip(self))]
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Board, IllegalMove> {
        match self.get(index) {
            None => Err(IllegalMove::OutOfRange(index)),
            Some(Square::Occupied(_)) => Err(IllegalMove::Occupied(index)),
            Some(Square::Empty) => {
                let mut next = *self;
                next.squares[index] = Square::Occupied(mark);
                Ok(next)
            }
        }
    }

    /// Formats the board as a human-readable grid.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => pos.to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
