use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_identity, AppState};
use crate::domain::{DailyActivity, DaySlot, UserSummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldersQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldersResponse {
    pub holders: Vec<String>,
    pub total_count: usize,
}

/// Holders in first-seen order. `limit` defaults to, and is capped at, the
/// page size limit.
pub async fn list_holders(
    Query(params): Query<HoldersQuery>,
    State(state): State<AppState>,
) -> Json<HoldersResponse> {
    let vault = state.ledger.read().await;
    let limit = params.limit.unwrap_or(vault.page_size_limit());
    let (holders, total_count) = vault.list_holders(params.offset.unwrap_or(0), limit);
    Json(HoldersResponse {
        holders: holders.into_iter().map(|h| h.to_string()).collect(),
        total_count,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub holder: String,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub current_shares: String,
    pub first_activity_at: u64,
    pub last_activity_at: u64,
}

impl UserSummaryDto {
    fn new(holder: String, summary: UserSummary) -> Self {
        Self {
            holder,
            total_deposited: summary.total_deposited.to_string(),
            total_withdrawn: summary.total_withdrawn.to_string(),
            current_shares: summary.current_shares.to_string(),
            first_activity_at: summary.first_activity_at.as_secs(),
            last_activity_at: summary.last_activity_at.as_secs(),
        }
    }
}

pub async fn get_user_summary(
    Path(holder): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserSummaryDto>, AppError> {
    let holder = parse_identity("holder", &holder)?;
    let summary = state.ledger.read().await.user_summary(&holder)?;
    Ok(Json(UserSummaryDto::new(holder.to_string(), summary)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivityDto {
    pub day_slot: u64,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub active_users: u64,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
}

impl DailyActivityDto {
    fn new(day: DaySlot, activity: DailyActivity) -> Self {
        Self {
            day_slot: day.as_u64(),
            total_deposited: activity.total_deposited.to_string(),
            total_withdrawn: activity.total_withdrawn.to_string(),
            active_users: activity.active_users,
            deposit_count: activity.deposit_count,
            withdrawal_count: activity.withdrawal_count,
        }
    }
}

/// All-zero for a day without activity.
pub async fn get_daily_activity(
    Path(day_slot): Path<u64>,
    State(state): State<AppState>,
) -> Json<DailyActivityDto> {
    let day = DaySlot::new(day_slot);
    let activity = state.ledger.read().await.daily_activity(day);
    Json(DailyActivityDto::new(day, activity))
}
