//! Journaled ledger settings.

use crate::domain::Identity;
use serde::{Deserialize, Serialize};

/// Default delay between proposing and executing a strategy change.
pub const DEFAULT_STRATEGY_TIMELOCK_SECS: u64 = 2 * 86_400;

/// Whether state-mutating holder operations are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingState {
    #[default]
    Active,
    Paused,
}

impl OperatingState {
    pub fn from_paused(paused: bool) -> Self {
        if paused {
            OperatingState::Paused
        } else {
            OperatingState::Active
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, OperatingState::Paused)
    }
}

/// Settings that live in the journal and are restored on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettings {
    pub admin: Identity,
    pub authorized_agent: Option<Identity>,
    #[serde(with = "crate::domain::primitives::amount_str")]
    pub minimum_deposit: u128,
    pub state: OperatingState,
    pub strategy_timelock_secs: u64,
}

impl LedgerSettings {
    /// Settings for a fresh ledger: no agent, active, minimum deposit of 1.
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            authorized_agent: None,
            minimum_deposit: 1,
            state: OperatingState::Active,
            strategy_timelock_secs: DEFAULT_STRATEGY_TIMELOCK_SECS,
        }
    }
}
