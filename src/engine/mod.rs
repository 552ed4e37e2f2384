//! Pure, synchronous state machines for the vault ledger.
//!
//! Nothing in here performs I/O or reads the clock; timestamps arrive inside
//! commands so that journal replay is deterministic.

pub mod activity;
pub mod decision_log;
pub mod error;
pub mod model_registry;
pub mod principal;
pub mod share_ledger;
pub mod strategy;
pub mod vault;

pub use activity::ActivityAggregator;
pub use decision_log::{DecisionLog, DecisionPage};
pub use error::{LedgerError, RangeError};
pub use model_registry::ModelSnapshotRegistry;
pub use principal::PrincipalTracker;
pub use share_ledger::ShareLedger;
pub use strategy::{PendingStrategy, StrategyTimelock};
pub use vault::{Applied, Outcome, Plan, Vault, DEFAULT_PAGE_SIZE_LIMIT};
