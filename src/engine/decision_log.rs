//! Append-only decision audit log.
//!
//! Records live in a vector where record `i` sits at position `i - 1`.
//! Secondary indices (`decision_type -> indices`, `strategy ref -> indices`)
//! are extended in the same step as the append, never rebuilt on query.
//! Index lookups return most-recent-first.

use std::collections::HashMap;

use crate::domain::{DecisionRecord, Identity, NewDecision, Timestamp};

use super::error::{LedgerError, RangeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPlan {
    record: DecisionRecord,
}

impl AppendPlan {
    pub fn index(&self) -> u64 {
        self.record.index
    }
}

/// One page of a range query plus the total number of records available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPage {
    pub records: Vec<DecisionRecord>,
    pub total_available: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionLog {
    records: Vec<DecisionRecord>,
    by_type: HashMap<String, Vec<u64>>,
    by_strategy: HashMap<String, Vec<u64>>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Authorization happens in the vault before this is reached.
    pub fn plan_append(
        &self,
        decision: NewDecision,
        at: Timestamp,
        recorded_by: &Identity,
    ) -> Result<AppendPlan, LedgerError> {
        let index = self
            .count()
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("decision index"))?;
        Ok(AppendPlan {
            record: DecisionRecord::new(index, decision, at, recorded_by.clone()),
        })
    }

    pub fn apply(&mut self, plan: AppendPlan) -> &DecisionRecord {
        let record = plan.record;
        let index = record.index;

        self.by_type
            .entry(record.decision_type.clone())
            .or_default()
            .push(index);
        for strategy in record.strategy_refs() {
            self.by_strategy
                .entry(strategy.to_string())
                .or_default()
                .push(index);
        }

        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn get(&self, index: u64) -> Option<&DecisionRecord> {
        if index == 0 {
            return None;
        }
        self.records.get((index - 1) as usize)
    }

    /// Records `from..=to`, capped at `page_limit` records starting at `from`.
    ///
    /// Requires `1 <= from <= to <= count`; each violated bound is reported
    /// separately.
    pub fn get_range(
        &self,
        from: u64,
        to: u64,
        page_limit: usize,
    ) -> Result<DecisionPage, LedgerError> {
        let count = self.count();
        let reason = if from == 0 || from > count {
            Some(RangeError::FromOutOfRange)
        } else if to > count {
            Some(RangeError::ToOutOfRange)
        } else if from > to {
            Some(RangeError::FromGreaterThanTo)
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(LedgerError::InvalidRange {
                reason,
                from,
                to,
                count,
            });
        }

        let start = (from - 1) as usize;
        let end = (to as usize).min(start.saturating_add(page_limit));
        Ok(DecisionPage {
            records: self.records[start..end].to_vec(),
            total_available: count,
        })
    }

    /// Records with `start <= timestamp <= end`, in index order, stopping
    /// after `max_results` matches.
    ///
    /// This is a linear scan over the log: there is no time index. It stops
    /// early once a timestamp passes `end`, since timestamps never decrease
    /// along the log.
    pub fn get_by_time_range(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> Result<Vec<DecisionRecord>, LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidRange {
                reason: RangeError::FromGreaterThanTo,
                from: start.as_secs(),
                to: end.as_secs(),
                count: self.count(),
            });
        }

        let mut found = Vec::new();
        for record in &self.records {
            if found.len() >= max_results || record.timestamp > end {
                break;
            }
            if record.timestamp >= start {
                found.push(record.clone());
            }
        }
        Ok(found)
    }

    /// Indices recorded under `decision_type`, most recent first.
    pub fn get_by_type(&self, decision_type: &str, max_results: usize) -> (Vec<u64>, usize) {
        Self::latest_first(self.by_type.get(decision_type), max_results)
    }

    /// Indices whose `from_ref` or `to_ref` equals `strategy_ref`, most
    /// recent first.
    pub fn get_by_strategy_ref(&self, strategy_ref: &str, max_results: usize) -> (Vec<u64>, usize) {
        Self::latest_first(self.by_strategy.get(strategy_ref), max_results)
    }

    fn latest_first(indices: Option<&Vec<u64>>, max_results: usize) -> (Vec<u64>, usize) {
        match indices {
            Some(indices) => (
                indices.iter().rev().take(max_results).copied().collect(),
                indices.len(),
            ),
            None => (Vec::new(), 0),
        }
    }

    /// True when every record sits at its index and timestamps never go back.
    pub fn is_contiguous(&self) -> bool {
        self.records
            .iter()
            .enumerate()
            .all(|(pos, r)| r.index == pos as u64 + 1)
            && self
                .records
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
    }
}
