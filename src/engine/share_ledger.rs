//! Proportional share accounting.
//!
//! Deposits mint `floor(amount * total_shares / total_value)` shares (1:1 for
//! the first depositor); withdrawals return `floor(shares * total_value /
//! total_shares)`. Truncation always favours the pool, so a deposit followed
//! by an immediate withdrawal never returns more than was put in.

use std::collections::HashMap;

use crate::domain::Identity;

use super::error::{checked_add, checked_sub, mul_div_floor, LedgerError};

/// Precomputed effects of a deposit. Produced by [`ShareLedger::plan_deposit`],
/// written by [`ShareLedger::apply_mint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintPlan {
    pub holder: Identity,
    pub amount: u128,
    pub shares_issued: u128,
    new_total_shares: u128,
    new_total_value: u128,
    new_balance: u128,
}

/// Precomputed effects of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnPlan {
    pub holder: Identity,
    pub shares_burned: u128,
    pub amount_returned: u128,
    new_total_shares: u128,
    new_total_value: u128,
    new_balance: u128,
}

/// Precomputed effects of a yield or loss report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePlan {
    pub delta: u128,
    pub new_total_value: u128,
}

#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    total_shares: u128,
    total_value: u128,
    balances: HashMap<Identity, u128>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn total_value(&self) -> u128 {
        self.total_value
    }

    /// Share balance of `holder`; zero for unknown or fully exited holders.
    pub fn shares_of(&self, holder: &Identity) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Sum of every balance, checked. Used by invariant audits.
    pub fn sum_of_balances(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
    }

    /// Shares a deposit of `amount` would mint right now, without any
    /// minimum-deposit check.
    pub fn preview_deposit(&self, amount: u128) -> Result<u128, LedgerError> {
        if self.total_shares == 0 {
            Ok(amount)
        } else {
            mul_div_floor(amount, self.total_shares, self.total_value, "deposit share conversion")
        }
    }

    /// Value `shares` would redeem for right now.
    pub fn preview_withdraw(&self, shares: u128) -> Result<u128, LedgerError> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        if shares == self.total_shares {
            return Ok(self.total_value);
        }
        mul_div_floor(shares, self.total_value, self.total_shares, "withdraw value conversion")
    }

    pub fn plan_deposit(
        &self,
        holder: &Identity,
        amount: u128,
        minimum_deposit: u128,
    ) -> Result<MintPlan, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("amount must be positive".into()));
        }
        if amount < minimum_deposit {
            return Err(LedgerError::InvalidAmount(format!(
                "amount {} is below the minimum deposit {}",
                amount, minimum_deposit
            )));
        }

        let shares_issued = self.preview_deposit(amount)?;
        if shares_issued == 0 {
            return Err(LedgerError::ZeroSharesMinted { amount });
        }

        Ok(MintPlan {
            holder: holder.clone(),
            amount,
            shares_issued,
            new_total_shares: checked_add(self.total_shares, shares_issued, "total shares")?,
            new_total_value: checked_add(self.total_value, amount, "total value")?,
            new_balance: checked_add(self.shares_of(holder), shares_issued, "holder balance")?,
        })
    }

    pub fn apply_mint(&mut self, plan: &MintPlan) {
        self.total_shares = plan.new_total_shares;
        self.total_value = plan.new_total_value;
        self.balances.insert(plan.holder.clone(), plan.new_balance);
    }

    pub fn plan_withdraw(&self, holder: &Identity, shares: u128) -> Result<BurnPlan, LedgerError> {
        if shares == 0 {
            return Err(LedgerError::InvalidShares("shares must be positive".into()));
        }
        let available = self.shares_of(holder);
        if available < shares {
            return Err(LedgerError::InsufficientShares {
                requested: shares,
                available,
            });
        }

        // The last exit takes the whole pool so no value is stranded.
        let amount_returned = self.preview_withdraw(shares)?;
        if amount_returned == 0 {
            return Err(LedgerError::InvalidShares(format!(
                "{} shares redeem for zero value",
                shares
            )));
        }

        Ok(BurnPlan {
            holder: holder.clone(),
            shares_burned: shares,
            amount_returned,
            new_total_shares: checked_sub(self.total_shares, shares, "total shares")?,
            new_total_value: checked_sub(self.total_value, amount_returned, "total value")?,
            new_balance: available - shares,
        })
    }

    pub fn apply_burn(&mut self, plan: &BurnPlan) {
        self.total_shares = plan.new_total_shares;
        self.total_value = plan.new_total_value;
        if plan.new_balance == 0 {
            self.balances.remove(&plan.holder);
        } else {
            self.balances.insert(plan.holder.clone(), plan.new_balance);
        }
    }

    /// Yield raises the value behind existing shares. Rejected with no shares
    /// outstanding, since nobody could ever redeem it.
    pub fn plan_yield(&self, amount: u128) -> Result<ValuePlan, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("yield must be positive".into()));
        }
        if self.total_shares == 0 {
            return Err(LedgerError::InvalidAmount(
                "cannot report yield with no shares outstanding".into(),
            ));
        }
        Ok(ValuePlan {
            delta: amount,
            new_total_value: checked_add(self.total_value, amount, "total value")?,
        })
    }

    /// A loss must leave some value behind while shares exist, otherwise the
    /// next deposit would divide by zero.
    pub fn plan_loss(&self, amount: u128) -> Result<ValuePlan, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("loss must be positive".into()));
        }
        if amount >= self.total_value {
            return Err(LedgerError::InvalidAmount(format!(
                "loss {} must be below total value {}",
                amount, self.total_value
            )));
        }
        Ok(ValuePlan {
            delta: amount,
            new_total_value: self.total_value - amount,
        })
    }

    pub fn apply_value(&mut self, plan: &ValuePlan) {
        self.total_value = plan.new_total_value;
    }

    /// Plan and apply a deposit in one step.
    pub fn deposit(
        &mut self,
        holder: &Identity,
        amount: u128,
        minimum_deposit: u128,
    ) -> Result<u128, LedgerError> {
        let plan = self.plan_deposit(holder, amount, minimum_deposit)?;
        self.apply_mint(&plan);
        Ok(plan.shares_issued)
    }

    /// Plan and apply a withdrawal in one step.
    pub fn withdraw(&mut self, holder: &Identity, shares: u128) -> Result<u128, LedgerError> {
        let plan = self.plan_withdraw(holder, shares)?;
        self.apply_burn(&plan);
        Ok(plan.amount_returned)
    }
}
