//! Outbound events for dashboards and indexers.

use crate::domain::{Identity, OperatingState, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueDirection {
    Yield,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum LedgerEvent {
    Deposited {
        holder: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        #[serde(with = "crate::domain::primitives::amount_str")]
        shares_issued: u128,
        timestamp: Timestamp,
    },
    Withdrawn {
        holder: Identity,
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
        #[serde(with = "crate::domain::primitives::amount_str")]
        shares_burned: u128,
        timestamp: Timestamp,
    },
    DecisionRecorded {
        index: u64,
        decision_type: String,
        timestamp: Timestamp,
    },
    ModelSnapshotCreated {
        index: u64,
        version: String,
    },
    ModelSnapshotActivated {
        index: u64,
        deactivated: Option<u64>,
    },
    ValueAdjusted {
        direction: ValueDirection,
        #[serde(with = "crate::domain::primitives::amount_str")]
        delta: u128,
        #[serde(with = "crate::domain::primitives::amount_str")]
        total_value: u128,
        timestamp: Timestamp,
    },
    AgentChanged {
        agent: Option<Identity>,
    },
    AdminTransferred {
        admin: Identity,
    },
    PauseChanged {
        state: OperatingState,
        caller: Identity,
    },
    MinimumDepositChanged {
        #[serde(with = "crate::domain::primitives::amount_str")]
        amount: u128,
    },
    StrategyProposed {
        strategy_ref: String,
        eta: Timestamp,
    },
    StrategyActivated {
        strategy_ref: String,
        previous: Option<String>,
    },
    StrategyCancelled {
        strategy_ref: String,
    },
}

impl LedgerEvent {
    /// Event name used as the SSE event type.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Deposited { .. } => "Deposited",
            LedgerEvent::Withdrawn { .. } => "Withdrawn",
            LedgerEvent::DecisionRecorded { .. } => "DecisionRecorded",
            LedgerEvent::ModelSnapshotCreated { .. } => "ModelSnapshotCreated",
            LedgerEvent::ModelSnapshotActivated { .. } => "ModelSnapshotActivated",
            LedgerEvent::ValueAdjusted { .. } => "ValueAdjusted",
            LedgerEvent::AgentChanged { .. } => "AgentChanged",
            LedgerEvent::AdminTransferred { .. } => "AdminTransferred",
            LedgerEvent::PauseChanged { .. } => "PauseChanged",
            LedgerEvent::MinimumDepositChanged { .. } => "MinimumDepositChanged",
            LedgerEvent::StrategyProposed { .. } => "StrategyProposed",
            LedgerEvent::StrategyActivated { .. } => "StrategyActivated",
            LedgerEvent::StrategyCancelled { .. } => "StrategyCancelled",
        }
    }
}
