//! Session-level errors and their wire reasons.

use crate::session::{ParticipantId, Phase};
use serde::{Deserialize, Serialize};
use tictac_game::{EngineError, IllegalMove, Mark};

/// Machine-readable error code sent to clients.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorReason {
    /// No live session has the code.
    SessionNotFound,
    /// Both seats are taken.
    SessionFull,
    /// The other mark is due to move.
    NotYourTurn,
    /// The target cell already holds a mark.
    CellOccupied,
    /// The move was tagged with a superseded generation.
    StaleGeneration,
    /// The cell index is off the board.
    IllegalMove,
    /// The engine was asked to move on a finished board.
    NoLegalMove,
    /// The session is not accepting moves.
    NotActive,
    /// Rematch is only possible after a game ends.
    RematchUnavailable,
    /// The sender is not seated in a session.
    NotInSession,
    /// The sender is already seated in a session.
    AlreadyInSession,
    /// The inbound message could not be decoded.
    MalformedMessage,
    /// No free code could be drawn.
    CodeSpaceExhausted,
}

/// Error raised by the registry, the authority or a binding.
///
/// Every variant is local to one session: state is unchanged and nothing is
/// broadcast to the other participant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// No live session has this code.
    #[display("Session {} not found", _0)]
    SessionNotFound(String),

    /// Both seats are taken.
    #[display("Session {} is full", _0)]
    SessionFull(String),

    /// The participant's mark is not due to move.
    #[display("Not your turn. Waiting for player {}", turn)]
    NotYourTurn {
        /// The mark that is due to move.
        turn: Mark,
    },

    /// The target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(usize),

    /// The move belongs to an earlier round.
    #[display("Stale generation {} (current is {})", submitted, current)]
    StaleGeneration {
        /// The session's current generation.
        current: u64,
        /// The generation the move was tagged with.
        submitted: u64,
    },

    /// The cell index is off the board.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMove),

    /// The engine had no move to make.
    #[display("{}", _0)]
    NoLegalMove(EngineError),

    /// Moves are rejected in this phase.
    #[display("Session is {} and not accepting moves", _0)]
    NotActive(Phase),

    /// Rematch requested outside the finished phase.
    #[display("Rematch is unavailable while the session is {}", _0)]
    RematchUnavailable(Phase),

    /// The participant is not seated in the session.
    #[display("Participant {} is not in a session", _0)]
    NotInSession(ParticipantId),

    /// The participant already holds a seat.
    #[display("Participant {} is already in session {}", participant, code)]
    AlreadyInSession {
        /// The participant.
        participant: ParticipantId,
        /// The session they are seated in.
        code: String,
    },

    /// The inbound message could not be decoded.
    #[display("Malformed message: {}", _0)]
    MalformedMessage(String),

    /// Every attempt to draw a fresh code collided.
    #[display("No free session code after {} attempts", _0)]
    CodeSpaceExhausted(usize),
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Returns the wire reason for this error.
    pub fn reason(&self) -> ErrorReason {
        match self {
            SessionError::SessionNotFound(_) => ErrorReason::SessionNotFound,
            SessionError::SessionFull(_) => ErrorReason::SessionFull,
            SessionError::NotYourTurn { .. } => ErrorReason::NotYourTurn,
            SessionError::CellOccupied(_) => ErrorReason::CellOccupied,
            SessionError::StaleGeneration { .. } => ErrorReason::StaleGeneration,
            SessionError::IllegalMove(_) => ErrorReason::IllegalMove,
            SessionError::NoLegalMove(_) => ErrorReason::NoLegalMove,
            SessionError::NotActive(_) => ErrorReason::NotActive,
            SessionError::RematchUnavailable(_) => ErrorReason::RematchUnavailable,
            SessionError::NotInSession(_) => ErrorReason::NotInSession,
            SessionError::AlreadyInSession { .. } => ErrorReason::AlreadyInSession,
            SessionError::MalformedMessage(_) => ErrorReason::MalformedMessage,
            SessionError::CodeSpaceExhausted(_) => ErrorReason::CodeSpaceExhausted,
        }
    }
}

impl From<IllegalMove> for SessionError {
    fn from(err: IllegalMove) -> Self {
        match err {
            IllegalMove::Occupied(cell) => SessionError::CellOccupied(cell),
            IllegalMove::OutOfRange(_) => SessionError::IllegalMove(err),
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::NoLegalMove(err)
    }
}
