//! Time-locked strategy changes.

use serde::Serialize;

use crate::domain::Timestamp;

use super::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStrategy {
    pub strategy_ref: String,
    pub proposed_at: Timestamp,
    pub eta: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyPlan {
    Propose(PendingStrategy),
    Execute {
        strategy_ref: String,
        previous: Option<String>,
    },
    Cancel {
        strategy_ref: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct StrategyTimelock {
    current: Option<String>,
    pending: Option<PendingStrategy>,
}

impl StrategyTimelock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingStrategy> {
        self.pending.as_ref()
    }

    /// A new proposal replaces any pending one and restarts the clock.
    pub fn plan_propose(
        &self,
        strategy_ref: &str,
        at: Timestamp,
        delay_secs: u64,
    ) -> Result<StrategyPlan, LedgerError> {
        let strategy_ref = strategy_ref.trim();
        if strategy_ref.is_empty() {
            return Err(LedgerError::InvalidStrategy);
        }
        Ok(StrategyPlan::Propose(PendingStrategy {
            strategy_ref: strategy_ref.to_string(),
            proposed_at: at,
            eta: at.saturating_add_secs(delay_secs),
        }))
    }

    pub fn plan_execute(&self, at: Timestamp) -> Result<StrategyPlan, LedgerError> {
        let pending = self.pending.as_ref().ok_or(LedgerError::NoPendingStrategy)?;
        if at < pending.eta {
            return Err(LedgerError::TimelockActive { eta: pending.eta });
        }
        Ok(StrategyPlan::Execute {
            strategy_ref: pending.strategy_ref.clone(),
            previous: self.current.clone(),
        })
    }

    pub fn plan_cancel(&self) -> Result<StrategyPlan, LedgerError> {
        let pending = self.pending.as_ref().ok_or(LedgerError::NoPendingStrategy)?;
        Ok(StrategyPlan::Cancel {
            strategy_ref: pending.strategy_ref.clone(),
        })
    }

    pub fn apply(&mut self, plan: &StrategyPlan) {
        match plan {
            StrategyPlan::Propose(pending) => self.pending = Some(pending.clone()),
            StrategyPlan::Execute { strategy_ref, .. } => {
                self.current = Some(strategy_ref.clone());
                self.pending = None;
            }
            StrategyPlan::Cancel { .. } => self.pending = None,
        }
    }
}
