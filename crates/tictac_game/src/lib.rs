//! Tic-tac-toe rules and decision engine.
//!
//! # Architecture
//!
//! - **Board model**: [`Board`], [`Mark`], [`Square`] and the pure
//!   [`evaluate`] function producing an [`Outcome`]
//! - **Decision engine**: [`DecisionEngine`] chooses moves for a scripted
//!   opponent at a given [`Tier`]
//!
//! # Example
//!
//! ```
//! use tictac_game::{Board, DecisionEngine, Mark, Outcome, Tier, evaluate};
//!
//! let board = Board::new().apply_move(4, Mark::X)?;
//! assert_eq!(evaluate(&board), Outcome::InProgress);
//!
//! let mut engine = DecisionEngine::with_seed(42);
//! let reply = engine.choose_move(&board, Tier::Perfect)?;
//! assert!(board.is_empty(reply));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
pub mod rules;
mod types;

pub use engine::{DecisionEngine, EngineError, Tier, best_move};
pub use rules::{Outcome, evaluate};
pub use types::{Board, CELLS, IllegalMove, Mark, Square};
