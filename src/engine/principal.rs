//! Cumulative principal per holder, for reporting.

use std::collections::HashMap;

use crate::domain::{Identity, PrincipalRecord, Timestamp};

use super::error::{checked_add, LedgerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalUpdate {
    pub holder: Identity,
    pub record: PrincipalRecord,
    pub is_new: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PrincipalTracker {
    records: HashMap<Identity, PrincipalRecord>,
}

impl PrincipalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, holder: &Identity) -> Option<&PrincipalRecord> {
        self.records.get(holder)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn plan_deposit(
        &self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<PrincipalUpdate, LedgerError> {
        let (record, is_new) = match self.records.get(holder) {
            Some(existing) => (
                PrincipalRecord {
                    total_deposited: checked_add(
                        existing.total_deposited,
                        amount,
                        "principal deposited",
                    )?,
                    last_activity_at: at,
                    ..*existing
                },
                false,
            ),
            None => (
                PrincipalRecord {
                    total_deposited: amount,
                    total_withdrawn: 0,
                    first_activity_at: at,
                    last_activity_at: at,
                },
                true,
            ),
        };
        Ok(PrincipalUpdate {
            holder: holder.clone(),
            record,
            is_new,
        })
    }

    /// Withdrawals only happen for holders that deposited before; an unknown
    /// holder still gets a record so the update stays total.
    pub fn plan_withdraw(
        &self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<PrincipalUpdate, LedgerError> {
        let (record, is_new) = match self.records.get(holder) {
            Some(existing) => (
                PrincipalRecord {
                    total_withdrawn: checked_add(
                        existing.total_withdrawn,
                        amount,
                        "principal withdrawn",
                    )?,
                    last_activity_at: at,
                    ..*existing
                },
                false,
            ),
            None => (
                PrincipalRecord {
                    total_deposited: 0,
                    total_withdrawn: amount,
                    first_activity_at: at,
                    last_activity_at: at,
                },
                true,
            ),
        };
        Ok(PrincipalUpdate {
            holder: holder.clone(),
            record,
            is_new,
        })
    }

    pub fn apply(&mut self, update: &PrincipalUpdate) {
        self.records.insert(update.holder.clone(), update.record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_deposit_creates_record() {
        let tracker = PrincipalTracker::new();
        let update = tracker
            .plan_deposit(&Identity::new("alice"), 100, Timestamp::new(10))
            .unwrap();
        assert!(update.is_new);
        assert_eq!(update.record.first_activity_at, Timestamp::new(10));
        assert_eq!(update.record.total_deposited, 100);
    }

    #[test]
    fn test_updates_accumulate_and_keep_first_activity() {
        let mut tracker = PrincipalTracker::new();
        let alice = Identity::new("alice");

        let u = tracker.plan_deposit(&alice, 100, Timestamp::new(10)).unwrap();
        tracker.apply(&u);
        let u = tracker.plan_deposit(&alice, 50, Timestamp::new(20)).unwrap();
        tracker.apply(&u);
        let u = tracker.plan_withdraw(&alice, 30, Timestamp::new(30)).unwrap();
        assert!(!u.is_new);
        tracker.apply(&u);

        let record = tracker.get(&alice).unwrap();
        assert_eq!(record.total_deposited, 150);
        assert_eq!(record.total_withdrawn, 30);
        assert_eq!(record.first_activity_at, Timestamp::new(10));
        assert_eq!(record.last_activity_at, Timestamp::new(30));
    }

    #[test]
    fn test_overflow_leaves_record_untouched() {
        let mut tracker = PrincipalTracker::new();
        let alice = Identity::new("alice");
        let u = tracker.plan_deposit(&alice, u128::MAX, Timestamp::new(1)).unwrap();
        tracker.apply(&u);

        assert!(matches!(
            tracker.plan_deposit(&alice, 1, Timestamp::new(2)),
            Err(LedgerError::ArithmeticOverflow(_))
        ));
        assert_eq!(tracker.get(&alice).unwrap().last_activity_at, Timestamp::new(1));
    }
}
