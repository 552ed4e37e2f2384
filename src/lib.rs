pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Journal, MemoryJournal, Repository};
pub use domain::{
    Command, DecisionRecord, Digest32, Identity, LedgerEvent, LedgerSettings, ModelSnapshot,
    NewDecision, NewModelSnapshot, Timestamp,
};
pub use engine::{LedgerError, Vault};
pub use error::AppError;
pub use orchestration::{
    Clock, DepositReceipt, LedgerService, ManualClock, ServiceError, SystemClock, WithdrawReceipt,
};
