//! # agora-store
//!
//! SQLite storage for Agora channel membership.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for users, channels,
//! channel members and the member history log.

pub mod channels;
pub mod database;
pub mod history;
pub mod members;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
