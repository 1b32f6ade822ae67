//! Decision engine for a scripted opponent.
//!
//! The engine plays whichever mark is due to move on the board it is given.
//! Weaker tiers mix the optimal search with uniformly random moves.

mod search;
mod tier;

pub use search::best_move;
pub use tier::Tier;

use crate::Board;
use crate::rules::evaluate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, warn};

/// Error raised when the engine is asked to move on a finished board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum EngineError {
    /// The board is full or already decided.
    #[display("No legal move: the game is already over")]
    NoLegalMove,
}

impl std::error::Error for EngineError {}

/// Move selector with its own random source.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    rng: StdRng,
}

impl DecisionEngine {
    /// Creates an engine seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a deterministic engine.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Selects a cell for the side to move.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoLegalMove`] when the board is full or already won.
    #[instrument(skip(self, board), fields(marks = board.marks_placed()))]
    pub fn choose_move(&mut self, board: &Board, tier: Tier) -> Result<usize, EngineError> {
        if evaluate(board).is_terminal() {
            warn!("Engine asked to move on a finished board");
            return Err(EngineError::NoLegalMove);
        }

        let optimal = self.rng.random_bool(tier.optimal_probability());
        let cell = if optimal {
            best_move(board)
        } else {
            self.random_move(board)
        }
        .ok_or(EngineError::NoLegalMove)?;

        debug!(cell, optimal, %tier, "Engine chose move");
        Ok(cell)
    }

    fn random_move(&mut self, board: &Board) -> Option<usize> {
        let cells = board.empty_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[self.rng.random_range(0..cells.len())])
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mark;

    #[test]
    fn test_weak_picks_empty_cells() {
        let mut engine = DecisionEngine::with_seed(7);
        let board = Board::new()
            .apply_move(4, Mark::X)
            .unwrap()
            .apply_move(0, Mark::O)
            .unwrap();
        for _ in 0..100 {
            let cell = engine.choose_move(&board, Tier::Weak).unwrap();
            assert!(board.is_empty(cell), "cell {} is not empty", cell);
        }
    }

    #[test]
    fn test_weak_eventually_varies() {
        let mut engine = DecisionEngine::with_seed(11);
        let board = Board::new();
        let picks: std::collections::HashSet<usize> = (0..200)
            .map(|_| engine.choose_move(&board, Tier::Weak).unwrap())
            .collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn test_perfect_matches_search() {
        let mut engine = DecisionEngine::with_seed(3);
        let board = Board::new()
            .apply_move(0, Mark::X)
            .unwrap()
            .apply_move(4, Mark::O)
            .unwrap()
            .apply_move(1, Mark::X)
            .unwrap();
        assert_eq!(engine.choose_move(&board, Tier::Perfect), Ok(2));
    }

    #[test]
    fn test_full_board_has_no_move() {
        let mut engine = DecisionEngine::with_seed(1);
        let board = [0, 1, 2, 4, 3, 5, 7, 6, 8]
            .iter()
            .enumerate()
            .fold(Board::new(), |b, (n, &i)| {
                let mark = if n % 2 == 0 { Mark::X } else { Mark::O };
                b.apply_move(i, mark).unwrap()
            });
        assert!(crate::rules::is_full(&board));
        assert_eq!(
            engine.choose_move(&board, Tier::Weak),
            Err(EngineError::NoLegalMove)
        );
    }
}
