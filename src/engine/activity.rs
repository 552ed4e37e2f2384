//! Per-holder and per-day activity rollups.
//!
//! Fed synchronously by the vault as part of each deposit/withdraw, never by
//! an asynchronous listener. Timestamps must be non-decreasing: the "seen
//! today" set is reset whenever a record lands in a different day slot.

use std::collections::{HashMap, HashSet};

use crate::domain::{DailyActivity, DaySlot, Identity, Timestamp, UserSummary};

use super::error::{checked_add, LedgerError};
use super::principal::{PrincipalTracker, PrincipalUpdate};
use super::share_ledger::ShareLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPlan {
    principal: PrincipalUpdate,
    day: DaySlot,
    daily: DailyActivity,
    resets_day: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityAggregator {
    principal: PrincipalTracker,
    daily: HashMap<DaySlot, DailyActivity>,
    holders: Vec<Identity>,
    seen_day: Option<DaySlot>,
    seen_today: HashSet<Identity>,
}

impl ActivityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan_deposit(
        &self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<ActivityPlan, LedgerError> {
        let principal = self.principal.plan_deposit(holder, amount, at)?;
        self.plan(principal, Flow::Deposit, amount, at)
    }

    pub fn plan_withdraw(
        &self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<ActivityPlan, LedgerError> {
        let principal = self.principal.plan_withdraw(holder, amount, at)?;
        self.plan(principal, Flow::Withdraw, amount, at)
    }

    fn plan(
        &self,
        principal: PrincipalUpdate,
        flow: Flow,
        amount: u128,
        at: Timestamp,
    ) -> Result<ActivityPlan, LedgerError> {
        let day = at.day_slot();
        let resets_day = self.seen_day != Some(day);
        let first_seen_today = resets_day || !self.seen_today.contains(&principal.holder);

        let mut daily = self.daily_activity(day);
        match flow {
            Flow::Deposit => {
                daily.total_deposited =
                    checked_add(daily.total_deposited, amount, "daily deposited")?;
                daily.deposit_count = daily
                    .deposit_count
                    .checked_add(1)
                    .ok_or(LedgerError::ArithmeticOverflow("daily deposit count"))?;
            }
            Flow::Withdraw => {
                daily.total_withdrawn =
                    checked_add(daily.total_withdrawn, amount, "daily withdrawn")?;
                daily.withdrawal_count = daily
                    .withdrawal_count
                    .checked_add(1)
                    .ok_or(LedgerError::ArithmeticOverflow("daily withdrawal count"))?;
            }
        }
        if first_seen_today {
            daily.active_users = daily
                .active_users
                .checked_add(1)
                .ok_or(LedgerError::ArithmeticOverflow("daily active users"))?;
        }

        Ok(ActivityPlan {
            principal,
            day,
            daily,
            resets_day,
        })
    }

    pub fn apply(&mut self, plan: &ActivityPlan) {
        if plan.principal.is_new {
            self.holders.push(plan.principal.holder.clone());
        }
        self.principal.apply(&plan.principal);

        if plan.resets_day {
            self.seen_today.clear();
            self.seen_day = Some(plan.day);
        }
        self.seen_today.insert(plan.principal.holder.clone());
        self.daily.insert(plan.day, plan.daily);
    }

    pub fn record_deposit(
        &mut self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<(), LedgerError> {
        let plan = self.plan_deposit(holder, amount, at)?;
        self.apply(&plan);
        Ok(())
    }

    pub fn record_withdraw(
        &mut self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<(), LedgerError> {
        let plan = self.plan_withdraw(holder, amount, at)?;
        self.apply(&plan);
        Ok(())
    }

    /// Principal plus current shares. `None` for a holder never seen.
    pub fn user_summary(&self, holder: &Identity, shares: &ShareLedger) -> Option<UserSummary> {
        self.principal.get(holder).map(|record| UserSummary {
            total_deposited: record.total_deposited,
            total_withdrawn: record.total_withdrawn,
            current_shares: shares.shares_of(holder),
            first_activity_at: record.first_activity_at,
            last_activity_at: record.last_activity_at,
        })
    }

    /// Stored rollup, or all zeros for a quiet day.
    pub fn daily_activity(&self, day: DaySlot) -> DailyActivity {
        self.daily.get(&day).copied().unwrap_or_default()
    }

    /// Holders in first-seen order, with the total count.
    pub fn list_holders(&self, offset: usize, limit: usize) -> (Vec<Identity>, usize) {
        let page = self
            .holders
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (page, self.holders.len())
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    fn id(s: &str) -> Identity {
        Identity::new(s)
    }

    #[test]
    fn test_active_users_counted_once_per_day() {
        let mut agg = ActivityAggregator::new();
        agg.record_deposit(&id("alice"), 100, Timestamp::new(10)).unwrap();
        agg.record_deposit(&id("alice"), 50, Timestamp::new(20)).unwrap();

        let day = agg.daily_activity(DaySlot::new(0));
        assert_eq!(day.deposit_count, 2);
        assert_eq!(day.active_users, 1);
        assert_eq!(day.total_deposited, 150);
    }

    #[test]
    fn test_withdraw_by_same_holder_does_not_recount() {
        let mut agg = ActivityAggregator::new();
        agg.record_deposit(&id("alice"), 100, Timestamp::new(10)).unwrap();
        agg.record_withdraw(&id("alice"), 40, Timestamp::new(20)).unwrap();
        agg.record_deposit(&id("bob"), 10, Timestamp::new(30)).unwrap();

        let day = agg.daily_activity(DaySlot::new(0));
        assert_eq!(day.active_users, 2);
        assert_eq!(day.withdrawal_count, 1);
        assert_eq!(day.total_withdrawn, 40);
    }

    #[test]
    fn test_seen_set_resets_on_new_day() {
        let mut agg = ActivityAggregator::new();
        agg.record_deposit(&id("alice"), 100, Timestamp::new(10)).unwrap();
        agg.record_deposit(&id("alice"), 100, Timestamp::new(DAY + 10)).unwrap();

        assert_eq!(agg.daily_activity(DaySlot::new(0)).active_users, 1);
        assert_eq!(agg.daily_activity(DaySlot::new(1)).active_users, 1);
        assert_eq!(agg.daily_activity(DaySlot::new(1)).deposit_count, 1);
    }

    #[test]
    fn test_quiet_day_is_all_zero() {
        let agg = ActivityAggregator::new();
        assert_eq!(agg.daily_activity(DaySlot::new(19_000)), DailyActivity::default());
    }

    #[test]
    fn test_list_holders_first_seen_order_without_duplicates() {
        let mut agg = ActivityAggregator::new();
        for (i, who) in ["carol", "alice", "carol", "bob", "alice"].iter().enumerate() {
            agg.record_deposit(&id(who), 1, Timestamp::new(i as u64)).unwrap();
        }

        let (page, total) = agg.list_holders(0, 10);
        assert_eq!(total, 3);
        assert_eq!(page, vec![id("carol"), id("alice"), id("bob")]);

        let (page, total) = agg.list_holders(1, 1);
        assert_eq!(total, 3);
        assert_eq!(page, vec![id("alice")]);

        let (page, _) = agg.list_holders(5, 10);
        assert!(page.is_empty());
    }

    #[test]
    fn test_user_summary_reads_current_shares() {
        let mut agg = ActivityAggregator::new();
        let mut shares = ShareLedger::new();
        let alice = id("alice");

        shares.deposit(&alice, 500, 1).unwrap();
        agg.record_deposit(&alice, 500, Timestamp::new(100)).unwrap();
        shares.withdraw(&alice, 200).unwrap();
        agg.record_withdraw(&alice, 200, Timestamp::new(200)).unwrap();

        let summary = agg.user_summary(&alice, &shares).unwrap();
        assert_eq!(summary.total_deposited, 500);
        assert_eq!(summary.total_withdrawn, 200);
        assert_eq!(summary.current_shares, 300);
        assert_eq!(summary.first_activity_at, Timestamp::new(100));
        assert_eq!(summary.last_activity_at, Timestamp::new(200));

        assert!(agg.user_summary(&id("nobody"), &shares).is_none());
    }

    #[test]
    fn test_failed_plan_changes_nothing() {
        let mut agg = ActivityAggregator::new();
        agg.record_deposit(&id("alice"), u128::MAX, Timestamp::new(1)).unwrap();
        assert!(agg.record_deposit(&id("bob"), 1, Timestamp::new(2)).is_err());

        assert_eq!(agg.holder_count(), 1);
        assert_eq!(agg.daily_activity(DaySlot::new(0)).active_users, 1);
    }
}
