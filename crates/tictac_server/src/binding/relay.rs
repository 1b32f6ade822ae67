//! Server-mediated binding: many sessions in one process.

use super::Outlet;
use crate::authority::Authority;
use crate::code::RoomCode;
use crate::error::SessionError;
use crate::protocol::{Intent, Notification, display_name};
use crate::registry::{SessionHandle, SessionRegistry, lock};
use crate::session::ParticipantId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

struct Connection {
    outlet: Box<dyn Outlet>,
    code: Option<RoomCode>,
}

/// Routes participant intents to the registry and the session authorities.
///
/// Notifications are delivered while the producing session's lock is held,
/// so both participants observe one session's broadcasts in the same order.
pub struct Relay {
    registry: SessionRegistry,
    connections: Mutex<HashMap<ParticipantId, Connection>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("registry", &self.registry)
            .field("connections", &lock(&self.connections).len())
            .finish()
    }
}

impl Relay {
    /// Creates a relay over `registry`.
    #[instrument]
    pub fn new(registry: SessionRegistry) -> Self {
        info!("Creating relay");
        Self {
            registry,
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Registers a new connection and returns its identity.
    #[instrument(skip_all)]
    pub fn connect(&self, outlet: Box<dyn Outlet>) -> ParticipantId {
        let id = ParticipantId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.connections).insert(id, Connection { outlet, code: None });
        info!(%id, "Connection registered");
        id
    }

    /// Handles one intent; rejections are reported to the sender only.
    #[instrument(skip(self))]
    pub fn handle(&self, id: ParticipantId, intent: Intent) {
        if let Err(err) = self.dispatch(id, intent) {
            self.reject(id, &err);
        }
    }

    /// Reports `err` to the sender.
    pub fn reject(&self, id: ParticipantId, err: &SessionError) {
        warn!(%id, reason = %err.reason(), error = %err, "Rejected");
        if let Some(connection) = lock(&self.connections).get(&id) {
            if connection.outlet.send(Notification::error(err)).is_err() {
                debug!(%id, "Could not deliver error");
            }
        }
    }

    /// Tears down the connection's session and forgets the connection.
    #[instrument(skip(self))]
    pub fn disconnect(&self, id: ParticipantId) {
        self.leave(id);
        lock(&self.connections).remove(&id);
        info!(%id, "Connection closed");
    }

    fn dispatch(&self, id: ParticipantId, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::CreateSession { name } => {
                self.ensure_unbound(id)?;
                let handle = self.registry.create(id, display_name(&name))?;
                self.bind(id, &handle);
                self.run(&handle, |_| Ok(()))
            }
            Intent::JoinSession { code, name } => {
                self.ensure_unbound(id)?;
                let parsed = RoomCode::parse(&code)
                    .ok_or_else(|| SessionError::SessionNotFound(code.clone()))?;
                let handle = self.registry.join(&parsed, id, display_name(&name))?;
                self.bind(id, &handle);
                self.run(&handle, |_| Ok(()))
            }
            Intent::SubmitMove { cell, generation } => {
                let handle = self.bound_session(id)?;
                self.run(&handle, |authority| {
                    authority.submit_move(id, cell, generation).map(|_| ())
                })
            }
            Intent::Rematch => {
                let handle = self.bound_session(id)?;
                self.run(&handle, |authority| authority.rematch(id))
            }
            Intent::Leave => {
                self.leave(id);
                Ok(())
            }
        }
    }

    fn leave(&self, id: ParticipantId) {
        let Ok(handle) = self.bound_session(id) else {
            debug!(%id, "Leave without a session");
            return;
        };
        let _ = self.run(&handle, |authority| {
            authority.terminate(id);
            Ok(())
        });
    }

    fn ensure_unbound(&self, id: ParticipantId) -> Result<(), SessionError> {
        match lock(&self.connections).get(&id).and_then(|c| c.code.clone()) {
            Some(code) => Err(SessionError::AlreadyInSession {
                participant: id,
                code: code.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn bind(&self, id: ParticipantId, handle: &SessionHandle) {
        let code = lock(handle).session().code().clone();
        if let Some(connection) = lock(&self.connections).get_mut(&id) {
            connection.code = Some(code);
        }
    }

    fn bound_session(&self, id: ParticipantId) -> Result<SessionHandle, SessionError> {
        let code = lock(&self.connections)
            .get(&id)
            .and_then(|c| c.code.clone())
            .ok_or(SessionError::NotInSession(id))?;
        self.registry
            .get(&code)
            .ok_or_else(|| SessionError::SessionNotFound(code.to_string()))
    }

    /// Runs `op` under the session lock, then delivers everything it queued.
    fn run(
        &self,
        handle: &SessionHandle,
        op: impl FnOnce(&mut Authority) -> Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        let (result, retired) = {
            let mut authority = lock(handle);
            let result = op(&mut authority);
            self.flush(&mut authority);
            let retired = authority.is_terminated().then(|| {
                let session = authority.session();
                let ids: Vec<ParticipantId> =
                    session.participants().iter().map(|p| *p.id()).collect();
                (session.code().clone(), ids)
            });
            (result, retired)
        };

        if let Some((code, ids)) = retired {
            self.retire(handle, &code, &ids);
        }
        result
    }

    /// Delivers queued envelopes in order. An unreachable participant ends
    /// the session, which queues `opponent-left` for the other one.
    fn flush(&self, authority: &mut Authority) {
        loop {
            let envelopes = authority.drain();
            if envelopes.is_empty() {
                return;
            }

            let mut unreachable = Vec::new();
            {
                let connections = lock(&self.connections);
                for envelope in envelopes {
                    let delivered = connections
                        .get(&envelope.to)
                        .is_some_and(|c| c.outlet.send(envelope.notification).is_ok());
                    if !delivered {
                        unreachable.push(envelope.to);
                    }
                }
            }

            for id in unreachable {
                if !authority.is_terminated() {
                    warn!(%id, "Send failed, terminating session");
                    authority.terminate(id);
                }
            }
        }
    }

    fn retire(&self, handle: &SessionHandle, code: &RoomCode, ids: &[ParticipantId]) {
        self.registry.remove_if_same(code, handle);
        let mut connections = lock(&self.connections);
        for id in ids {
            if let Some(connection) = connections.get_mut(id)
                && connection.code.as_ref() == Some(code)
            {
                connection.code = None;
            }
        }
        debug!(%code, "Session retired");
    }
}
