//! Agent decision records.

use crate::domain::{Identity, Timestamp};
use serde::{Deserialize, Serialize};

/// Decision content supplied by the agent.
///
/// `reason` and the external references are untrusted metadata: nothing
/// checks that they point at a real model output or a retrievable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDecision {
    pub decision_type: String,
    pub from_ref: String,
    pub to_ref: String,
    #[serde(with = "crate::domain::primitives::amount_str")]
    pub amount: u128,
    pub reason: String,
    pub external_ref_a: String,
    pub external_ref_b: String,
}

/// Immutable audit entry. `index` starts at 1 and has no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub index: u64,
    pub decision_type: String,
    pub from_ref: String,
    pub to_ref: String,
    #[serde(with = "crate::domain::primitives::amount_str")]
    pub amount: u128,
    pub reason: String,
    pub external_ref_a: String,
    pub external_ref_b: String,
    pub timestamp: Timestamp,
    pub recorded_by: Identity,
}

impl DecisionRecord {
    pub fn new(index: u64, decision: NewDecision, timestamp: Timestamp, recorded_by: Identity) -> Self {
        Self {
            index,
            decision_type: decision.decision_type,
            from_ref: decision.from_ref,
            to_ref: decision.to_ref,
            amount: decision.amount,
            reason: decision.reason,
            external_ref_a: decision.external_ref_a,
            external_ref_b: decision.external_ref_b,
            timestamp,
            recorded_by,
        }
    }

    /// Strategy references this record is indexed under: `from_ref` and
    /// `to_ref`, skipping empty values and a duplicate when both match.
    pub fn strategy_refs(&self) -> Vec<&str> {
        let mut refs = Vec::with_capacity(2);
        if !self.from_ref.is_empty() {
            refs.push(self.from_ref.as_str());
        }
        if !self.to_ref.is_empty() && self.to_ref != self.from_ref {
            refs.push(self.to_ref.as_str());
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from_ref: &str, to_ref: &str) -> DecisionRecord {
        DecisionRecord::new(
            1,
            NewDecision {
                decision_type: "REBALANCE".to_string(),
                from_ref: from_ref.to_string(),
                to_ref: to_ref.to_string(),
                amount: 0,
                reason: String::new(),
                external_ref_a: String::new(),
                external_ref_b: String::new(),
            },
            Timestamp::new(10),
            Identity::new("agent"),
        )
    }

    #[test]
    fn test_strategy_refs_dedupes_and_skips_empty() {
        assert_eq!(record("aave", "compound").strategy_refs(), vec!["aave", "compound"]);
        assert_eq!(record("aave", "aave").strategy_refs(), vec!["aave"]);
        assert_eq!(record("", "compound").strategy_refs(), vec!["compound"]);
        assert!(record("", "").strategy_refs().is_empty());
    }
}
