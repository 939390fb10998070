//! Persistent state store for the reverse-tunnel service
//!
//! This crate keeps authentication tokens and tunnel routes in memory behind a single
//! lock and snapshots the whole state to one JSON file after every mutation, so the
//! service comes back with the same tokens and routes after a restart.

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod models;
pub mod snapshot;

// Re-export commonly used types for convenience
pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{DbError, Result};
pub use models::{TokenData, Tunnel};
pub use snapshot::Snapshot;
