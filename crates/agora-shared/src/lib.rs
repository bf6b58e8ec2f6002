//! # agora-shared
//!
//! Types shared by the Agora store and server crates: strongly typed
//! identifiers, the application error taxonomy, and the membership event
//! that is broadcast to connected clients.

pub mod constants;
pub mod error;
pub mod events;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use events::{BroadcastEvent, MembershipEvent};
pub use types::{ChannelId, TeamId, UserId};
