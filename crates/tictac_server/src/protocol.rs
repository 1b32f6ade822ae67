//! Wire protocol between participants and the authority.
//!
//! Messages are JSON objects tagged by a kebab-case `type` field, e.g.
//! `{"type":"submit-move","cell":4,"generation":1}`.

use crate::code::RoomCode;
use crate::error::{ErrorReason, SessionError};
use crate::session::{ParticipantId, Session};
use serde::{Deserialize, Serialize};
use tictac_game::{Board, Mark, Outcome};

/// Display name used when a participant leaves theirs blank.
pub const DEFAULT_NAME: &str = "Player";

/// An action requested by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Intent {
    /// Open a new session and take the first seat.
    CreateSession {
        /// Creator's display name.
        #[serde(default)]
        name: String,
    },
    /// Take the second seat of an existing session.
    JoinSession {
        /// Session code, any case.
        code: String,
        /// Joiner's display name.
        #[serde(default)]
        name: String,
    },
    /// Place a mark.
    SubmitMove {
        /// Cell index, 0-8.
        cell: usize,
        /// Generation the move was made against.
        generation: u64,
    },
    /// Start the next game after one has ended.
    Rematch,
    /// Abandon the session.
    Leave,
}

/// A participant as shown to both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Display name.
    pub name: String,
    /// Assigned mark.
    pub mark: Mark,
}

/// Something the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    /// The sender's session exists and is waiting for an opponent.
    SessionCreated {
        /// Code to share with the opponent.
        code: RoomCode,
        /// The creator's mark.
        mark: Mark,
    },
    /// The sender took the second seat.
    SessionJoined {
        /// The session code.
        code: RoomCode,
        /// The joiner's mark.
        mark: Mark,
    },
    /// A new game begins.
    GameStart {
        /// Both players, creator first.
        players: Vec<PlayerInfo>,
        /// The empty board.
        board: Board,
        /// The mark that moves first.
        turn: Mark,
        /// Generation to tag moves with.
        generation: u64,
    },
    /// A move was accepted.
    StateUpdate {
        /// Cell just played.
        cell: usize,
        /// Mark that played it.
        mark: Mark,
        /// Board after the move.
        board: Board,
        /// Mark due to move next.
        turn: Mark,
        /// Generation the move belonged to.
        generation: u64,
        /// Present once the game has ended.
        result: Option<Outcome>,
    },
    /// The other participant left; the session is gone.
    OpponentLeft,
    /// The sender's last action was rejected.
    Error {
        /// Machine-readable code.
        reason: ErrorReason,
        /// Human-readable detail.
        message: String,
    },
}

impl Notification {
    /// Builds a `game-start` for the session's current round.
    pub fn game_start(session: &Session) -> Self {
        Notification::GameStart {
            players: session
                .participants()
                .iter()
                .map(|p| PlayerInfo {
                    name: p.name().clone(),
                    mark: *p.mark(),
                })
                .collect(),
            board: *session.board(),
            turn: session.turn(),
            generation: session.generation(),
        }
    }

    /// Builds the error reply for a rejected action.
    pub fn error(err: &SessionError) -> Self {
        Notification::Error {
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

/// A notification addressed to one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Recipient.
    pub to: ParticipantId,
    /// Payload.
    pub notification: Notification,
}

/// Normalizes a display name, substituting [`DEFAULT_NAME`] for blanks.
pub fn display_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parses_kebab_case_tags() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"submit-move","cell":4,"generation":1}"#).unwrap();
        assert_eq!(intent, Intent::SubmitMove { cell: 4, generation: 1 });

        let intent: Intent = serde_json::from_str(r#"{"type":"rematch"}"#).unwrap();
        assert_eq!(intent, Intent::Rematch);

        let intent: Intent =
            serde_json::from_str(r#"{"type":"join-session","code":"ab12"}"#).unwrap();
        assert_eq!(
            intent,
            Intent::JoinSession {
                code: "ab12".to_string(),
                name: String::new()
            }
        );
    }

    #[test]
    fn test_notification_wire_shape() {
        let json = serde_json::to_value(Notification::SessionCreated {
            code: RoomCode::parse("ab12").unwrap(),
            mark: Mark::X,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "session-created", "code": "AB12", "mark": "X"})
        );

        let json = serde_json::to_value(Notification::OpponentLeft).unwrap();
        assert_eq!(json, serde_json::json!({"type": "opponent-left"}));
    }

    #[test]
    fn test_blank_names_get_default() {
        assert_eq!(display_name("  "), DEFAULT_NAME);
        assert_eq!(display_name(" Ann "), "Ann");
    }
}
