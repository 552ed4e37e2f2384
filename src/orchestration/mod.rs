pub mod clock;
pub mod ledger_service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger_service::{DepositReceipt, LedgerService, ServiceError, WithdrawReceipt};
