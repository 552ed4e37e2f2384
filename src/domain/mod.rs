//! Domain types for the vault ledger.
//!
//! This module provides:
//! - Primitives: Identity, Timestamp, DaySlot, Digest32
//! - Decision records and model snapshots
//! - Activity views (principal, user summary, daily rollup)
//! - Journaled settings and commands, and outbound events

pub mod activity;
pub mod command;
pub mod decision;
pub mod event;
pub mod model_snapshot;
pub mod primitives;
pub mod settings;

pub use activity::{DailyActivity, PrincipalRecord, UserSummary};
pub use command::{Command, JournalEntry};
pub use decision::{DecisionRecord, NewDecision};
pub use event::{LedgerEvent, ValueDirection};
pub use model_snapshot::{ModelSnapshot, NewModelSnapshot, MAX_PERFORMANCE_SCORE};
pub use primitives::{
    DaySlot, Digest32, DigestParseError, Identity, IdentityParseError, Timestamp, SECONDS_PER_DAY,
};
pub use settings::{LedgerSettings, OperatingState, DEFAULT_STRATEGY_TIMELOCK_SECS};
