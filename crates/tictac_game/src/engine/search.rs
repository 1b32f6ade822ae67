//! Exhaustive adversarial search with alpha-beta pruning.
//!
//! Boards are `Copy`, so every recursive call works on its own value and
//! concurrent searches share nothing.

use crate::rules::{Outcome, evaluate};
use crate::{Board, Mark};

const WIN: i32 = 10;

/// Returns the optimal move for the side to move, or `None` if the game is over.
///
/// A win scores `10 - depth`, a loss `depth - 10` and a draw `0`, so faster
/// wins and slower losses are preferred. Ties go to the lowest cell index.
pub fn best_move(board: &Board) -> Option<usize> {
    if evaluate(board).is_terminal() {
        return None;
    }

    let engine = board.next_mark();
    let mut alpha = i32::MIN;
    let mut best: Option<(usize, i32)> = None;

    for cell in board.empty_cells() {
        let Ok(child) = board.apply_move(cell, engine) else {
            continue;
        };
        let score = minimax(&child, engine, engine.opponent(), 1, alpha, i32::MAX);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((cell, score));
            alpha = alpha.max(score);
        }
    }

    best.map(|(cell, _)| cell)
}

fn minimax(
    board: &Board,
    engine: Mark,
    to_move: Mark,
    depth: i32,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    match evaluate(board) {
        Outcome::Win { mark, .. } if mark == engine => return WIN - depth,
        Outcome::Win { .. } => return depth - WIN,
        Outcome::Draw => return 0,
        Outcome::InProgress => {}
    }

    let maximizing = to_move == engine;
    let mut value = if maximizing { i32::MIN } else { i32::MAX };

    for cell in board.empty_cells() {
        let Ok(child) = board.apply_move(cell, to_move) else {
            continue;
        };
        let score = minimax(&child, engine, to_move.opponent(), depth + 1, alpha, beta);
        if maximizing {
            value = value.max(score);
            alpha = alpha.max(value);
        } else {
            value = value.min(score);
            beta = beta.min(value);
        }
        if alpha >= beta {
            break;
        }
    }

    value
}
