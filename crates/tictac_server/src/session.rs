//! Game session state for two matched participants.

use crate::code::RoomCode;
use derive_getters::Getters;
use serde::Serialize;
use tictac_game::{Board, Mark, Outcome, evaluate};

/// Identifies one connected participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Creator seated, waiting for a second participant.
    #[display("forming")]
    Forming,
    /// A game is being played.
    #[display("active")]
    Active,
    /// The game ended; a rematch may start the next one.
    #[display("finished")]
    Finished,
    /// A participant left. Terminal.
    #[display("terminated")]
    Terminated,
}

/// A seated participant.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_new::new)]
pub struct Participant {
    /// Connection identity.
    id: ParticipantId,
    /// Display name.
    name: String,
    /// Assigned mark.
    mark: Mark,
}

/// One matched pair of participants playing under a shared code.
///
/// Only the [`Authority`](crate::Authority) mutates a session.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) code: RoomCode,
    pub(crate) participants: Vec<Participant>,
    pub(crate) board: Board,
    pub(crate) turn: Mark,
    pub(crate) phase: Phase,
    pub(crate) generation: u64,
}

impl Session {
    /// Creates a forming session with the creator seated as X.
    pub(crate) fn new(code: RoomCode, creator: ParticipantId, name: String) -> Self {
        Self {
            code,
            participants: vec![Participant::new(creator, name, Mark::X)],
            board: Board::new(),
            turn: Mark::X,
            phase: Phase::Forming,
            generation: 0,
        }
    }

    /// The session code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seated participants, creator first.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The mark due to move.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// The lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Round counter, incremented at every game start.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The result of the current board.
    pub fn outcome(&self) -> Outcome {
        evaluate(&self.board)
    }

    /// Finds a seated participant.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| *p.id() == id)
    }

    /// True once both seats are filled.
    pub fn is_full(&self) -> bool {
        self.participants.len() >= 2
    }
}
