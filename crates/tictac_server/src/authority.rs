//! The single writer of one session's state.
//!
//! Every transition validates its preconditions before touching the session,
//! so a rejected action leaves the board byte-identical. Accepted transitions
//! queue their notifications in a FIFO outbox which bindings drain while
//! holding the session lock.

use crate::code::RoomCode;
use crate::error::SessionError;
use crate::protocol::{Envelope, Notification};
use crate::session::{Participant, ParticipantId, Phase, Session};
use std::collections::VecDeque;
use tictac_game::{Board, Mark, Outcome, Square, evaluate};
use tracing::{debug, info, instrument, warn};

/// Payload of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveApplied {
    /// Board after the move.
    pub board: Board,
    /// Mark due to move next (unchanged when the move ended the game).
    pub turn: Mark,
    /// Result of the new board.
    pub outcome: Outcome,
}

/// Authoritative state machine for one session.
#[derive(Debug)]
pub struct Authority {
    session: Session,
    outbox: VecDeque<Envelope>,
}

impl Authority {
    /// Opens a forming session with the creator seated as X.
    ///
    /// Queues `session-created` for the creator.
    #[instrument(skip(code, name), fields(code = %code))]
    pub fn new(code: RoomCode, creator: ParticipantId, name: String) -> Self {
        let session = Session::new(code.clone(), creator, name);
        info!(%creator, "Session created");
        let mut authority = Self {
            session,
            outbox: VecDeque::new(),
        };
        authority.push(
            creator,
            Notification::SessionCreated {
                code,
                mark: Mark::X,
            },
        );
        authority
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True once a participant has left.
    pub fn is_terminated(&self) -> bool {
        self.session.phase == Phase::Terminated
    }

    /// Takes every queued envelope in production order.
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.outbox.drain(..).collect()
    }

    /// Seats the joiner as O and starts the first game.
    ///
    /// Queues `session-joined` for the joiner, then `game-start` for both.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] once terminated,
    /// [`SessionError::SessionFull`] when the session is no longer forming,
    /// [`SessionError::AlreadyInSession`] when the creator tries to join itself.
    #[instrument(skip(self, name), fields(code = %self.session.code))]
    pub fn join(&mut self, joiner: ParticipantId, name: String) -> Result<(), SessionError> {
        let code = self.session.code.to_string();
        match self.session.phase {
            Phase::Terminated => return Err(SessionError::SessionNotFound(code)),
            Phase::Forming if !self.session.is_full() => {}
            _ => {
                warn!(%joiner, "Session already has 2 players");
                return Err(SessionError::SessionFull(code));
            }
        }
        if self.session.participant(joiner).is_some() {
            return Err(SessionError::AlreadyInSession {
                participant: joiner,
                code,
            });
        }

        info!(%joiner, mark = "O", "Registering joiner");
        self.session
            .participants
            .push(Participant::new(joiner, name, Mark::O));
        self.push(
            joiner,
            Notification::SessionJoined {
                code: self.session.code.clone(),
                mark: Mark::O,
            },
        );
        self.start_round();
        Ok(())
    }

    /// Validates and applies a move.
    ///
    /// Queues `state-update` for both participants.
    ///
    /// # Errors
    ///
    /// Checked in order: [`SessionError::NotInSession`],
    /// [`SessionError::StaleGeneration`], [`SessionError::NotActive`],
    /// [`SessionError::NotYourTurn`], [`SessionError::IllegalMove`],
    /// [`SessionError::CellOccupied`]. On any error the session is unchanged.
    #[instrument(skip(self), fields(code = %self.session.code))]
    pub fn submit_move(
        &mut self,
        participant: ParticipantId,
        cell: usize,
        generation: u64,
    ) -> Result<MoveApplied, SessionError> {
        let mark = *self
            .session
            .participant(participant)
            .ok_or_else(|| {
                warn!(%participant, "Unknown participant attempted move");
                SessionError::NotInSession(participant)
            })?
            .mark();

        if generation != self.session.generation {
            warn!(
                submitted = generation,
                current = self.session.generation,
                "Dropping move from superseded round"
            );
            return Err(SessionError::StaleGeneration {
                current: self.session.generation,
                submitted: generation,
            });
        }

        if self.session.phase != Phase::Active {
            return Err(SessionError::NotActive(self.session.phase));
        }

        if mark != self.session.turn {
            warn!(
                player_mark = %mark,
                expected_mark = %self.session.turn,
                "Player tried to move out of turn"
            );
            return Err(SessionError::NotYourTurn {
                turn: self.session.turn,
            });
        }

        let board = self.session.board.apply_move(cell, mark).map_err(|e| {
            warn!(error = %e, "Invalid move");
            SessionError::from(e)
        })?;

        debug_assert!(
            board_invariants_hold(&self.session.board, &board),
            "board invariants violated"
        );

        let outcome = evaluate(&board);
        self.session.board = board;
        if outcome.is_terminal() {
            self.session.phase = Phase::Finished;
            info!(%outcome, "Game finished");
        } else {
            self.session.turn = mark.opponent();
        }

        debug!(cell, %mark, next = %self.session.turn, "Move applied");
        self.broadcast(Notification::StateUpdate {
            cell,
            mark,
            board,
            turn: self.session.turn,
            generation: self.session.generation,
            result: outcome.terminal(),
        });

        Ok(MoveApplied {
            board,
            turn: self.session.turn,
            outcome,
        })
    }

    /// Starts the next game after one has finished.
    ///
    /// Clears the board, gives X the first move, increments the generation
    /// and queues `game-start` for both.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInSession`] for strangers and
    /// [`SessionError::RematchUnavailable`] unless the session is finished.
    #[instrument(skip(self), fields(code = %self.session.code))]
    pub fn rematch(&mut self, participant: ParticipantId) -> Result<(), SessionError> {
        if self.session.participant(participant).is_none() {
            return Err(SessionError::NotInSession(participant));
        }
        if self.session.phase != Phase::Finished {
            warn!(phase = %self.session.phase, "Rematch requested mid-session");
            return Err(SessionError::RematchUnavailable(self.session.phase));
        }
        info!(%participant, "Rematch accepted");
        self.start_round();
        Ok(())
    }

    /// Ends the session because `leaver` disconnected.
    ///
    /// Queues `opponent-left` for the remaining participant. Idempotent.
    #[instrument(skip(self), fields(code = %self.session.code))]
    pub fn terminate(&mut self, leaver: ParticipantId) {
        if self.is_terminated() {
            debug!("Session already terminated");
            return;
        }
        info!(%leaver, phase = %self.session.phase, "Terminating session");
        self.session.phase = Phase::Terminated;
        let remaining: Vec<ParticipantId> = self
            .session
            .participants
            .iter()
            .map(|p| *p.id())
            .filter(|id| *id != leaver)
            .collect();
        for id in remaining {
            self.push(id, Notification::OpponentLeft);
        }
    }

    fn start_round(&mut self) {
        self.session.board = Board::new();
        self.session.turn = Mark::X;
        self.session.phase = Phase::Active;
        self.session.generation += 1;
        info!(generation = self.session.generation, "Game started");
        self.broadcast(Notification::game_start(&self.session));
    }

    fn broadcast(&mut self, notification: Notification) {
        let ids: Vec<ParticipantId> = self.session.participants.iter().map(|p| *p.id()).collect();
        for id in ids {
            self.push(id, notification.clone());
        }
    }

    fn push(&mut self, to: ParticipantId, notification: Notification) {
        self.outbox.push_back(Envelope { to, notification });
    }
}

/// Checks that `after` only adds one mark to `before` and that mark counts
/// still differ by at most one.
fn board_invariants_hold(before: &Board, after: &Board) -> bool {
    let monotonic = before
        .squares()
        .iter()
        .zip(after.squares())
        .all(|(b, a)| *b == Square::Empty || b == a);
    let added = after.marks_placed() == before.marks_placed() + 1;
    let x = after.count(Mark::X);
    let o = after.count(Mark::O);
    monotonic && added && x.abs_diff(o) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: ParticipantId = ParticipantId(1);
    const BOB: ParticipantId = ParticipantId(2);

    fn active() -> Authority {
        let mut authority = Authority::new(RoomCode::parse("AB12").unwrap(), ALICE, "Alice".into());
        authority.join(BOB, "Bob".into()).unwrap();
        authority.drain();
        authority
    }

    #[test]
    fn test_creation_announces_code_to_creator() {
        let mut authority = Authority::new(RoomCode::parse("ZZ99").unwrap(), ALICE, "Alice".into());
        let out = authority.drain();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, ALICE);
        assert!(matches!(
            &out[0].notification,
            Notification::SessionCreated { mark: Mark::X, .. }
        ));
        assert_eq!(authority.session().phase(), Phase::Forming);
        assert_eq!(authority.session().generation(), 0);
    }

    #[test]
    fn test_join_starts_generation_one() {
        let authority = active();
        assert_eq!(authority.session().phase(), Phase::Active);
        assert_eq!(authority.session().generation(), 1);
        assert_eq!(authority.session().turn(), Mark::X);
    }

    #[test]
    fn test_creator_cannot_join_own_session() {
        let mut authority = Authority::new(RoomCode::parse("AB12").unwrap(), ALICE, "Alice".into());
        assert!(matches!(
            authority.join(ALICE, "Alice".into()),
            Err(SessionError::AlreadyInSession { .. })
        ));
    }

    #[test]
    fn test_move_in_forming_phase_rejected() {
        let mut authority = Authority::new(RoomCode::parse("AB12").unwrap(), ALICE, "Alice".into());
        assert_eq!(
            authority.submit_move(ALICE, 0, 0),
            Err(SessionError::NotActive(Phase::Forming))
        );
    }

    #[test]
    fn test_stranger_rejected() {
        let mut authority = active();
        assert_eq!(
            authority.submit_move(ParticipantId(99), 0, 1),
            Err(SessionError::NotInSession(ParticipantId(99)))
        );
    }

    #[test]
    fn test_out_of_range_is_illegal_move() {
        let mut authority = active();
        let err = authority.submit_move(ALICE, 9, 1).unwrap_err();
        assert_eq!(err.reason(), crate::ErrorReason::IllegalMove);
        assert!(authority.drain().is_empty());
    }

    #[test]
    fn test_rematch_mid_game_rejected() {
        let mut authority = active();
        assert_eq!(
            authority.rematch(BOB),
            Err(SessionError::RematchUnavailable(Phase::Active))
        );
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut authority = active();
        authority.terminate(ALICE);
        authority.terminate(BOB);
        let out = authority.drain();
        assert_eq!(
            out,
            vec![Envelope {
                to: BOB,
                notification: Notification::OpponentLeft
            }]
        );
    }

    #[test]
    fn test_invariant_check_detects_overwrite() {
        let before = Board::new().apply_move(0, Mark::X).unwrap();
        let after = Board::new().apply_move(0, Mark::O).unwrap();
        assert!(!board_invariants_hold(&before, &after));
        let after = before.apply_move(4, Mark::O).unwrap();
        assert!(board_invariants_hold(&before, &after));
    }
}
