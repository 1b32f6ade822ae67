//! Transport bindings between participants and the authority.
//!
//! - [`Relay`]: server-mediated, many sessions per process
//! - [`DirectHost`] / [`DirectGuest`]: one peer hosts the authority
//! - [`SoloMatch`]: a local player against the decision engine

mod direct;
mod relay;
mod solo;

pub use direct::{DirectGuest, DirectHost};
pub use relay::Relay;
pub use solo::{FirstPlayer, SoloMatch};

use crate::protocol::Notification;
use tokio::sync::mpsc::UnboundedSender;

/// The receiving side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Participant disconnected")]
pub struct Disconnected;

/// Per-participant sink for notifications.
pub trait Outlet: Send + Sync {
    /// Delivers one notification without blocking.
    ///
    /// # Errors
    ///
    /// [`Disconnected`] when the participant can no longer be reached.
    fn send(&self, notification: Notification) -> Result<(), Disconnected>;
}

impl Outlet for UnboundedSender<Notification> {
    fn send(&self, notification: Notification) -> Result<(), Disconnected> {
        UnboundedSender::send(self, notification).map_err(|_| Disconnected)
    }
}
