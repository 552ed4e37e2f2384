//! Per-holder and per-day activity views.

use crate::domain::Timestamp;
use serde::{Deserialize, Serialize};

/// Cumulative principal for one holder. Reporting only; share math never
/// reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalRecord {
    pub total_deposited: u128,
    pub total_withdrawn: u128,
    pub first_activity_at: Timestamp,
    pub last_activity_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub total_deposited: u128,
    pub total_withdrawn: u128,
    pub current_shares: u128,
    pub first_activity_at: Timestamp,
    pub last_activity_at: Timestamp,
}

/// Additive rollup for one day slot. All-zero when nothing happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub total_deposited: u128,
    pub total_withdrawn: u128,
    pub active_users: u64,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
}
