use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{caller_from_headers, parse_amount, AppState};
use crate::domain::{DecisionRecord, NewDecision, Timestamp};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub decision_type: String,
    #[serde(default)]
    pub from_ref: String,
    #[serde(default)]
    pub to_ref: String,
    pub amount: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub external_ref_a: String,
    #[serde(default)]
    pub external_ref_b: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDto {
    pub index: u64,
    pub decision_type: String,
    pub from_ref: String,
    pub to_ref: String,
    pub amount: String,
    pub reason: String,
    pub external_ref_a: String,
    pub external_ref_b: String,
    pub timestamp: u64,
    pub recorded_by: String,
}

impl From<&DecisionRecord> for DecisionDto {
    fn from(r: &DecisionRecord) -> Self {
        Self {
            index: r.index,
            decision_type: r.decision_type.clone(),
            from_ref: r.from_ref.clone(),
            to_ref: r.to_ref.clone(),
            amount: r.amount.to_string(),
            reason: r.reason.clone(),
            external_ref_a: r.external_ref_a.clone(),
            external_ref_b: r.external_ref_b.clone(),
            timestamp: r.timestamp.as_secs(),
            recorded_by: r.recorded_by.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    pub index: u64,
}

pub async fn post_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<RecordedResponse>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let decision = NewDecision {
        decision_type: body.decision_type,
        from_ref: body.from_ref,
        to_ref: body.to_ref,
        amount: parse_amount("amount", &body.amount)?,
        reason: body.reason,
        external_ref_a: body.external_ref_a,
        external_ref_b: body.external_ref_b,
    };
    let index = state.ledger.record_decision(caller, decision).await?;
    Ok(Json(RecordedResponse { index }))
}

pub async fn get_decision(
    Path(index): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<DecisionDto>, AppError> {
    let vault = state.ledger.read().await;
    Ok(Json(DecisionDto::from(vault.decision(index)?)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResponse {
    pub records: Vec<DecisionDto>,
    pub total_available: u64,
}

pub async fn get_range(
    Query(params): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<RangeResponse>, AppError> {
    let vault = state.ledger.read().await;
    let page = vault.decision_range(params.from, params.to)?;
    Ok(Json(RangeResponse {
        records: page.records.iter().map(DecisionDto::from).collect(),
        total_available: page.total_available,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeQuery {
    pub start: u64,
    pub end: u64,
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeResponse {
    pub records: Vec<DecisionDto>,
    pub total_found: usize,
}

pub async fn get_by_time(
    Query(params): Query<TimeQuery>,
    State(state): State<AppState>,
) -> Result<Json<TimeResponse>, AppError> {
    let vault = state.ledger.read().await;
    let max_results = params.max_results.unwrap_or(vault.page_size_limit());
    let records = vault.decisions_by_time(
        Timestamp::new(params.start),
        Timestamp::new(params.end),
        max_results,
    )?;
    Ok(Json(TimeResponse {
        total_found: records.len(),
        records: records.iter().map(DecisionDto::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxResultsQuery {
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicesResponse {
    /// Most recent first.
    pub indices: Vec<u64>,
    pub total_found: usize,
}

pub async fn get_by_type(
    Path(decision_type): Path<String>,
    Query(params): Query<MaxResultsQuery>,
    State(state): State<AppState>,
) -> Json<IndicesResponse> {
    let vault = state.ledger.read().await;
    let max_results = params.max_results.unwrap_or(vault.page_size_limit());
    let (indices, total_found) = vault.decisions_by_type(&decision_type, max_results);
    Json(IndicesResponse {
        indices,
        total_found,
    })
}

pub async fn get_by_strategy(
    Path(strategy_ref): Path<String>,
    Query(params): Query<MaxResultsQuery>,
    State(state): State<AppState>,
) -> Json<IndicesResponse> {
    let vault = state.ledger.read().await;
    let max_results = params.max_results.unwrap_or(vault.page_size_limit());
    let (indices, total_found) = vault.decisions_by_strategy(&strategy_ref, max_results);
    Json(IndicesResponse {
        indices,
        total_found,
    })
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    index: u64,
    decision_type: &'a str,
    from_ref: &'a str,
    to_ref: &'a str,
    amount: String,
    reason: &'a str,
    external_ref_a: &'a str,
    external_ref_b: &'a str,
    timestamp: u64,
    recorded_by: &'a str,
}

/// Render decision records as CSV with a header row.
pub fn decisions_to_csv(records: &[DecisionRecord]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for r in records {
        writer
            .serialize(CsvRow {
                index: r.index,
                decision_type: &r.decision_type,
                from_ref: &r.from_ref,
                to_ref: &r.to_ref,
                amount: r.amount.to_string(),
                reason: &r.reason,
                external_ref_a: &r.external_ref_a,
                external_ref_b: &r.external_ref_b,
                timestamp: r.timestamp.as_secs(),
                recorded_by: r.recorded_by.as_str(),
            })
            .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))
}

/// Same range rules and page cap as `get_range`.
pub async fn export_csv(
    Query(params): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .ledger
        .read()
        .await
        .decision_range(params.from, params.to)?;
    let body = decisions_to_csv(&page.records)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;

    #[test]
    fn test_csv_quotes_free_text() {
        let record = DecisionRecord::new(
            1,
            NewDecision {
                decision_type: "REBALANCE".to_string(),
                from_ref: "aave".to_string(),
                to_ref: "compound".to_string(),
                amount: u128::MAX,
                reason: "apy, \"risk\" adjusted".to_string(),
                external_ref_a: String::new(),
                external_ref_b: String::new(),
            },
            Timestamp::new(42),
            Identity::new("agent"),
        );

        let csv = String::from_utf8(decisions_to_csv(&[record]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "index,decision_type,from_ref,to_ref,amount,reason,external_ref_a,external_ref_b,timestamp,recorded_by"
        );
        assert_eq!(
            lines.next().unwrap(),
            format!(
                "1,REBALANCE,aave,compound,{},\"apy, \"\"risk\"\" adjusted\",,,42,agent",
                u128::MAX
            )
        );
    }

    #[test]
    fn test_csv_of_nothing_is_empty() {
        assert!(decisions_to_csv(&[]).unwrap().is_empty());
    }
}
