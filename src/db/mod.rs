//! SQLite storage
//!
//! Pooled connections plus the versioned schema for units and budgets.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
