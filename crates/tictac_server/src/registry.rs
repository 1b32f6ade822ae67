//! Table of live sessions keyed by code.

use crate::authority::Authority;
use crate::code::{CodeSource, RandomCodes, RoomCode};
use crate::error::SessionError;
use crate::session::{ParticipantId, Phase};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Default number of fresh codes drawn before giving up.
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 64;

/// Shared, lockable authority for one session.
pub type SessionHandle = Arc<Mutex<Authority>>;

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Summary of a live session for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session code.
    pub code: RoomCode,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Seated participants (1 or 2).
    pub players: usize,
    /// Current round.
    pub generation: u64,
}

/// Manages all live sessions.
///
/// Cloning yields another handle onto the same table. The table lock is only
/// held for lookups, inserts and removals; each session has its own lock.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<RoomCode, SessionHandle>>>,
    codes: Arc<dyn CodeSource>,
    max_code_attempts: usize,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .field("max_code_attempts", &self.max_code_attempts)
            .finish()
    }
}

impl SessionRegistry {
    /// Creates an empty registry with random codes.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::with_codes(Arc::new(RandomCodes::new()), DEFAULT_MAX_CODE_ATTEMPTS)
    }

    /// Creates an empty registry drawing codes from `codes`.
    pub fn with_codes(codes: Arc<dyn CodeSource>, max_code_attempts: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            codes,
            max_code_attempts: max_code_attempts.max(1),
        }
    }

    /// Opens a session under a fresh code with `creator` seated as X.
    ///
    /// Collisions with live codes are retried with new draws.
    ///
    /// # Errors
    ///
    /// [`SessionError::CodeSpaceExhausted`] if every attempt collided.
    #[instrument(skip(self, name))]
    pub fn create(
        &self,
        creator: ParticipantId,
        name: String,
    ) -> Result<SessionHandle, SessionError> {
        let mut sessions = lock(&self.sessions);
        for attempt in 1..=self.max_code_attempts {
            let code = self.codes.next_code();
            if sessions.contains_key(&code) {
                debug!(%code, attempt, "Code collision, drawing again");
                continue;
            }
            let handle = Arc::new(Mutex::new(Authority::new(code.clone(), creator, name)));
            sessions.insert(code.clone(), Arc::clone(&handle));
            info!(%code, live = sessions.len(), "Registered session");
            return Ok(handle);
        }
        warn!(attempts = self.max_code_attempts, "Code space exhausted");
        Err(SessionError::CodeSpaceExhausted(self.max_code_attempts))
    }

    /// Seats `joiner` in the session named by `code`.
    ///
    /// The joiner's notifications are queued in the session's outbox.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] if no live session has the code and
    /// [`SessionError::SessionFull`] if both seats are taken.
    #[instrument(skip(self, code, name), fields(code = %code))]
    pub fn join(
        &self,
        code: &RoomCode,
        joiner: ParticipantId,
        name: String,
    ) -> Result<SessionHandle, SessionError> {
        let sessions = lock(&self.sessions);
        let handle = sessions
            .get(code)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(code.to_string()))?;
        lock(&handle).join(joiner, name)?;
        Ok(handle)
    }

    /// Looks up a live session.
    pub fn get(&self, code: &RoomCode) -> Option<SessionHandle> {
        lock(&self.sessions).get(code).cloned()
    }

    /// Deletes a session. Removing an absent code is a no-op.
    #[instrument(skip(self, code), fields(code = %code))]
    pub fn remove(&self, code: &RoomCode) {
        if lock(&self.sessions).remove(code).is_some() {
            info!("Removed session");
        }
    }

    /// Deletes the session under `code` only if it is still `handle`.
    ///
    /// A code freed earlier may already name a newer session; that one is
    /// left alone.
    #[instrument(skip(self, code, handle), fields(code = %code))]
    pub fn remove_if_same(&self, code: &RoomCode, handle: &SessionHandle) {
        let mut sessions = lock(&self.sessions);
        match sessions.get(code) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(code);
                info!("Removed session");
            }
            Some(_) => debug!("Code now names another session, keeping it"),
            None => {}
        }
    }

    /// Summaries of every live session, ordered by code.
    pub fn list(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = lock(&self.sessions).values().cloned().collect();
        let mut summaries: Vec<SessionSummary> = handles
            .iter()
            .map(|handle| {
                let authority = lock(handle);
                let session = authority.session();
                SessionSummary {
                    code: session.code().clone(),
                    phase: session.phase(),
                    players: session.participants().len(),
                    generation: session.generation(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// True when no session is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
