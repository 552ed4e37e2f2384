//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The `Journal` abstraction over the command journal
//! - Repository layer implementing it on SQLite

pub mod journal;
pub mod migrations;
pub mod repo;

pub use journal::{Journal, JournalError, MemoryJournal};
pub use migrations::init_db;
pub use repo::Repository;
