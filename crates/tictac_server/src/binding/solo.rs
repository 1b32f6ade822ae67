//! Local single-player binding against the decision engine.

use super::Outlet;
use crate::authority::Authority;
use crate::code::RoomCode;
use crate::error::SessionError;
use crate::protocol::display_name;
use crate::session::{ParticipantId, Phase, Session};
use tictac_game::{DecisionEngine, Mark, Tier};
use tracing::{debug, info, instrument, warn};

const HUMAN: ParticipantId = ParticipantId(1);
const ENGINE: ParticipantId = ParticipantId(2);
const ENGINE_NAME: &str = "Engine";

/// Which side takes the first move (X) in every game.
///
/// Defaults to [`FirstPlayer::Human`] so the player moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstPlayer {
    /// The human plays X.
    #[default]
    Human,
    /// The engine plays X.
    Engine,
}

impl FirstPlayer {
    /// Returns the display label for this option.
    pub fn label(self) -> &'static str {
        match self {
            Self::Human => "Player",
            Self::Engine => ENGINE_NAME,
        }
    }
}

/// One human against the decision engine, refereed by an [`Authority`].
///
/// The engine answers as soon as the turn passes to it. Only the human's
/// notifications are delivered.
pub struct SoloMatch {
    authority: Authority,
    engine: DecisionEngine,
    tier: Tier,
    human: Box<dyn Outlet>,
}

impl std::fmt::Debug for SoloMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoloMatch")
            .field("authority", &self.authority)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl SoloMatch {
    /// Seats both sides and starts the first game.
    ///
    /// # Errors
    ///
    /// Propagates an engine failure on its opening move.
    #[instrument(skip(engine, human))]
    pub fn new(
        name: &str,
        tier: Tier,
        first: FirstPlayer,
        engine: DecisionEngine,
        human: Box<dyn Outlet>,
    ) -> Result<Self, SessionError> {
        let code = RoomCode::random(&mut rand::rng());
        let name = display_name(name);
        let authority = match first {
            FirstPlayer::Human => {
                let mut authority = Authority::new(code, HUMAN, name);
                authority.join(ENGINE, ENGINE_NAME.to_string())?;
                authority
            }
            FirstPlayer::Engine => {
                let mut authority = Authority::new(code, ENGINE, ENGINE_NAME.to_string());
                authority.join(HUMAN, name)?;
                authority
            }
        };
        info!(%tier, first = first.label(), "Solo match started");

        let mut solo = Self {
            authority,
            engine,
            tier,
            human,
        };
        let reply = solo.respond();
        solo.flush();
        reply.map(|_| solo)
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &Session {
        self.authority.session()
    }

    /// Engine strength.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// The human's mark.
    pub fn human_mark(&self) -> Mark {
        self.authority
            .session()
            .participant(HUMAN)
            .map_or(Mark::X, |p| *p.mark())
    }

    /// Plays the human's move, then the engine's reply.
    ///
    /// # Errors
    ///
    /// Whatever the authority rejects; the session is unchanged.
    #[instrument(skip(self))]
    pub fn play(&mut self, cell: usize) -> Result<(), SessionError> {
        let generation = self.session().generation();
        let result = self
            .authority
            .submit_move(HUMAN, cell, generation)
            .map(|_| ())
            .and_then(|()| self.respond());
        self.flush();
        result
    }

    /// Starts the next game once the current one is finished.
    ///
    /// # Errors
    ///
    /// [`SessionError::RematchUnavailable`] unless the game has ended.
    #[instrument(skip(self))]
    pub fn rematch(&mut self) -> Result<(), SessionError> {
        let result = self.authority.rematch(HUMAN).and_then(|()| self.respond());
        self.flush();
        result
    }

    /// Abandons the match.
    pub fn leave(&mut self) {
        self.authority.terminate(HUMAN);
        self.flush();
    }

    fn respond(&mut self) -> Result<(), SessionError> {
        let session = self.authority.session();
        if session.phase() != Phase::Active || session.turn() == self.human_mark() {
            return Ok(());
        }
        let board = *session.board();
        let generation = session.generation();
        let cell = self.engine.choose_move(&board, self.tier)?;
        debug!(cell, "Engine reply");
        self.authority.submit_move(ENGINE, cell, generation)?;
        Ok(())
    }

    fn flush(&mut self) {
        for envelope in self.authority.drain() {
            if envelope.to != HUMAN {
                continue;
            }
            if self.human.send(envelope.notification).is_err() {
                warn!("Player outlet closed, ending match");
                self.authority.terminate(HUMAN);
                self.authority.drain();
                return;
            }
        }
    }
}
