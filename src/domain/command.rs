//! Journaled commands.
//!
//! Every accepted state change is one `Command`, stamped with the caller and
//! the time it was accepted. Replaying the journal in order through the vault
//! rebuilds the exact same state.

use crate::domain::{Identity, LedgerSettings, NewDecision, NewModelSnapshot, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Deposit {
        holder: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        at: Timestamp,
    },
    Withdraw {
        holder: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        shares: u128,
        at: Timestamp,
    },
    ReportYield {
        caller: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        at: Timestamp,
    },
    ReportLoss {
        caller: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        at: Timestamp,
    },
    RecordDecision {
        caller: Identity,
        decision: NewDecision,
        at: Timestamp,
    },
    CreateModelSnapshot {
        caller: Identity,
        snapshot: NewModelSnapshot,
        at: Timestamp,
    },
    ActivateModelSnapshot {
        caller: Identity,
        index: u64,
        at: Timestamp,
    },
    SetAuthorizedAgent {
        caller: Identity,
        agent: Option<Identity>,
        at: Timestamp,
    },
    TransferAdmin {
        caller: Identity,
        admin: Identity,
        at: Timestamp,
    },
    SetPaused {
        caller: Identity,
        paused: bool,
        at: Timestamp,
    },
    SetMinimumDeposit {
        caller: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        at: Timestamp,
    },
    ProposeStrategy {
        caller: Identity,
        strategy_ref: String,
        at: Timestamp,
    },
    ExecuteStrategy {
        caller: Identity,
        at: Timestamp,
    },
    CancelStrategy {
        caller: Identity,
        at: Timestamp,
    },
}

impl Command {
    /// Stable name stored in the journal's `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Deposit { .. } => "deposit",
            Command::Withdraw { .. } => "withdraw",
            Command::ReportYield { .. } => "report_yield",
            Command::ReportLoss { .. } => "report_loss",
            Command::RecordDecision { .. } => "record_decision",
            Command::CreateModelSnapshot { .. } => "create_model_snapshot",
            Command::ActivateModelSnapshot { .. } => "activate_model_snapshot",
            Command::SetAuthorizedAgent { .. } => "set_authorized_agent",
            Command::TransferAdmin { .. } => "transfer_admin",
            Command::SetPaused { .. } => "set_paused",
            Command::SetMinimumDeposit { .. } => "set_minimum_deposit",
            Command::ProposeStrategy { .. } => "propose_strategy",
            Command::ExecuteStrategy { .. } => "execute_strategy",
            Command::CancelStrategy { .. } => "cancel_strategy",
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Command::Deposit { at, .. }
            | Command::Withdraw { at, .. }
            | Command::ReportYield { at, .. }
            | Command::ReportLoss { at, .. }
            | Command::RecordDecision { at, .. }
            | Command::CreateModelSnapshot { at, .. }
            | Command::ActivateModelSnapshot { at, .. }
            | Command::SetAuthorizedAgent { at, .. }
            | Command::TransferAdmin { at, .. }
            | Command::SetPaused { at, .. }
            | Command::SetMinimumDeposit { at, .. }
            | Command::ProposeStrategy { at, .. }
            | Command::ExecuteStrategy { at, .. }
            | Command::CancelStrategy { at, .. } => *at,
        }
    }

    /// Commands rejected while the ledger is paused. Admin commands stay
    /// available so the ledger can be unpaused; decisions and model snapshots
    /// stay available so the audit trail keeps recording.
    pub fn is_pause_gated(&self) -> bool {
        matches!(
            self,
            Command::Deposit { .. }
                | Command::Withdraw { .. }
                | Command::ReportYield { .. }
                | Command::ReportLoss { .. }
                | Command::ExecuteStrategy { .. }
        )
    }
}

/// One row of the persisted journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum JournalEntry {
    /// First row of every journal; seeds the vault.
    Genesis { settings: LedgerSettings },
    Command { command: Command },
}

impl JournalEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            JournalEntry::Genesis { .. } => "genesis",
            JournalEntry::Command { command } => command.kind(),
        }
    }
}
