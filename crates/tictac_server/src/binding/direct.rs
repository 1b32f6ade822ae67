//! Peer-hosted binding.
//!
//! The peer that creates the session hosts the [`Authority`]; the other peer
//! is a follower that renders what the host confirms.

use super::Outlet;
use crate::authority::Authority;
use crate::code::RoomCode;
use crate::error::SessionError;
use crate::protocol::{Intent, Notification, display_name};
use crate::session::{ParticipantId, Session};
use tictac_game::{Board, Mark, Outcome};
use tracing::{debug, info, instrument, warn};

const HOST: ParticipantId = ParticipantId(1);
const GUEST: ParticipantId = ParticipantId(2);

/// Authority-holding side of a peer-to-peer session.
///
/// Notifications for the hosting player go to the local outlet, the guest's
/// go over the link.
pub struct DirectHost {
    authority: Authority,
    local: Box<dyn Outlet>,
    link: Box<dyn Outlet>,
}

impl std::fmt::Debug for DirectHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectHost")
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl DirectHost {
    /// Opens a session under a random code with the host seated as X.
    #[instrument(skip(local, link))]
    pub fn new(name: &str, local: Box<dyn Outlet>, link: Box<dyn Outlet>) -> Self {
        let code = RoomCode::random(&mut rand::rng());
        info!(%code, "Hosting direct session");
        let mut host = Self {
            authority: Authority::new(code, HOST, display_name(name)),
            local,
            link,
        };
        host.flush();
        host
    }

    /// The code the guest must present.
    pub fn code(&self) -> &RoomCode {
        self.authority.session().code()
    }

    /// Read-only view of the authoritative session.
    pub fn session(&self) -> &Session {
        self.authority.session()
    }

    /// Handles an intent from the hosting player.
    #[instrument(skip(self), fields(code = %self.code()))]
    pub fn on_local(&mut self, intent: Intent) {
        let result = match intent {
            Intent::SubmitMove { cell, generation } => self
                .authority
                .submit_move(HOST, cell, generation)
                .map(|_| ()),
            Intent::Rematch => self.authority.rematch(HOST),
            Intent::Leave => {
                self.authority.terminate(HOST);
                Ok(())
            }
            Intent::CreateSession { .. } | Intent::JoinSession { .. } => {
                Err(SessionError::AlreadyInSession {
                    participant: HOST,
                    code: self.code().to_string(),
                })
            }
        };
        self.settle(HOST, result);
    }

    /// Handles an intent that arrived over the link.
    #[instrument(skip(self), fields(code = %self.code()))]
    pub fn on_remote(&mut self, intent: Intent) {
        let result = match intent {
            Intent::JoinSession { code, name } => match RoomCode::parse(&code) {
                Some(parsed) if &parsed == self.code() => {
                    self.authority.join(GUEST, display_name(&name))
                }
                _ => Err(SessionError::SessionNotFound(code)),
            },
            Intent::SubmitMove { cell, generation } => self
                .authority
                .submit_move(GUEST, cell, generation)
                .map(|_| ()),
            Intent::Rematch => self.authority.rematch(GUEST),
            Intent::Leave => {
                self.authority.terminate(GUEST);
                Ok(())
            }
            Intent::CreateSession { .. } => Err(SessionError::MalformedMessage(
                "the host owns this session".to_string(),
            )),
        };
        self.settle(GUEST, result);
    }

    /// The link to the guest dropped.
    #[instrument(skip(self), fields(code = %self.code()))]
    pub fn link_lost(&mut self) {
        self.authority.terminate(GUEST);
        self.flush();
    }

    fn settle(&mut self, sender: ParticipantId, result: Result<(), SessionError>) {
        if let Err(err) = result {
            warn!(%sender, reason = %err.reason(), error = %err, "Rejected");
            if self.outlet(sender).send(Notification::error(&err)).is_err() {
                self.authority.terminate(sender);
            }
        }
        self.flush();
    }

    fn outlet(&self, id: ParticipantId) -> &dyn Outlet {
        if id == HOST {
            self.local.as_ref()
        } else {
            self.link.as_ref()
        }
    }

    fn flush(&mut self) {
        loop {
            let envelopes = self.authority.drain();
            if envelopes.is_empty() {
                return;
            }
            for envelope in envelopes {
                let to = envelope.to;
                if self.outlet(to).send(envelope.notification).is_err()
                    && !self.authority.is_terminated()
                {
                    warn!(%to, "Send failed, terminating session");
                    self.authority.terminate(to);
                }
            }
        }
    }
}

/// Follower side of a peer-to-peer session.
///
/// Holds only what the host confirmed, plus at most one optimistic move
/// shown until the next authoritative message arrives.
#[derive(Debug, Clone, Default)]
pub struct DirectGuest {
    code: Option<RoomCode>,
    mark: Option<Mark>,
    confirmed: Board,
    turn: Option<Mark>,
    generation: u64,
    result: Option<Outcome>,
    preview: Option<usize>,
    opponent_left: bool,
}

impl DirectGuest {
    /// Creates a follower that has not joined yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the join request for the host.
    pub fn join(code: &str, name: &str) -> Intent {
        Intent::JoinSession {
            code: code.to_string(),
            name: display_name(name),
        }
    }

    /// Records a local click as a preview and returns the intent to send.
    ///
    /// Returns `None` when the move is obviously invalid from the confirmed
    /// state, in which case nothing is sent.
    #[instrument(skip(self))]
    pub fn preview(&mut self, cell: usize) -> Option<Intent> {
        let mark = self.mark?;
        let playable = !self.opponent_left
            && self.result.is_none()
            && self.turn == Some(mark)
            && self.preview.is_none()
            && self.confirmed.is_empty(cell);
        if !playable {
            debug!(cell, "Preview refused");
            return None;
        }
        self.preview = Some(cell);
        Some(Intent::SubmitMove {
            cell,
            generation: self.generation,
        })
    }

    /// Applies a notification from the host, discarding any preview.
    #[instrument(skip(self))]
    pub fn apply(&mut self, notification: &Notification) {
        self.preview = None;
        match notification {
            Notification::SessionJoined { code, mark } => {
                self.code = Some(code.clone());
                self.mark = Some(*mark);
            }
            Notification::GameStart {
                board,
                turn,
                generation,
                ..
            } => {
                self.confirmed = *board;
                self.turn = Some(*turn);
                self.generation = *generation;
                self.result = None;
            }
            Notification::StateUpdate {
                board,
                turn,
                generation,
                result,
                ..
            } => {
                if *generation != self.generation {
                    debug!(generation, current = self.generation, "Ignoring old update");
                    return;
                }
                self.confirmed = *board;
                self.turn = Some(*turn);
                self.result = *result;
            }
            Notification::OpponentLeft => self.opponent_left = true,
            Notification::Error { reason, message } => {
                debug!(%reason, %message, "Host rejected move");
            }
            Notification::SessionCreated { .. } => {}
        }
    }

    /// The board to render: the confirmed board plus any preview.
    pub fn board(&self) -> Board {
        match (self.preview, self.mark) {
            (Some(cell), Some(mark)) => self
                .confirmed
                .apply_move(cell, mark)
                .unwrap_or(self.confirmed),
            _ => self.confirmed,
        }
    }

    /// The last board the host confirmed.
    pub fn confirmed(&self) -> &Board {
        &self.confirmed
    }

    /// The session code once joined.
    pub fn code(&self) -> Option<&RoomCode> {
        self.code.as_ref()
    }

    /// This side's mark once joined.
    pub fn mark(&self) -> Option<Mark> {
        self.mark
    }

    /// The mark due to move, as last confirmed.
    pub fn turn(&self) -> Option<Mark> {
        self.turn
    }

    /// The current round.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The result of the last finished game in this round.
    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    /// True while a preview awaits confirmation.
    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    /// True once the host left.
    pub fn opponent_left(&self) -> bool {
        self.opponent_left
    }
}
