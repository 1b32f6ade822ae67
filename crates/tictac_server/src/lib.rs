//! Two-player tic-tac-toe sessions.
//!
//! # Architecture
//!
//! - **Registry**: [`SessionRegistry`] maps short [`RoomCode`]s to sessions
//! - **Authority**: [`Authority`] is the only writer of a [`Session`]; it
//!   validates every [`Intent`] and queues [`Notification`]s
//! - **Bindings**: [`Relay`] serves many sessions over WebSocket,
//!   [`DirectHost`] / [`DirectGuest`] run one session between two peers,
//!   [`SoloMatch`] pits a player against the decision engine

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod authority;
mod binding;
mod code;
mod config;
mod error;
mod http;
mod protocol;
mod registry;
mod session;

pub use authority::{Authority, MoveApplied};
pub use binding::{
    DirectGuest, DirectHost, Disconnected, FirstPlayer, Outlet, Relay, SoloMatch,
};
pub use code::{CODE_LENGTH, CodeSource, RandomCodes, RoomCode};
pub use config::{ConfigError, ServerConfig};
pub use error::{ErrorReason, SessionError};
pub use http::{router, serve};
pub use protocol::{DEFAULT_NAME, Envelope, Intent, Notification, PlayerInfo, display_name};
pub use registry::{DEFAULT_MAX_CODE_ATTEMPTS, SessionHandle, SessionRegistry, SessionSummary};
pub use session::{Participant, ParticipantId, Phase, Session};
