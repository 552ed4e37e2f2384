use crate::engine::LedgerError;
use crate::orchestration::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "INTERNAL",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Ledger(e) => e.code(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Ledger(e) => match e {
                LedgerError::Unauthorized(_) => StatusCode::FORBIDDEN,
                LedgerError::NotFound(_) | LedgerError::NoActiveModel => StatusCode::NOT_FOUND,
                LedgerError::SystemPaused
                | LedgerError::TimelockActive { .. }
                | LedgerError::NoPendingStrategy => StatusCode::CONFLICT,
                LedgerError::ArithmeticOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::InvalidAmount(_)
                | LedgerError::ZeroSharesMinted { .. }
                | LedgerError::InvalidShares(_)
                | LedgerError::InsufficientShares { .. }
                | LedgerError::InvalidRange { .. }
                | LedgerError::InvalidPerformanceScore(_)
                | LedgerError::InvalidVersion
                | LedgerError::InvalidStrategy => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Ledger(e) => AppError::Ledger(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RangeError;

    #[test]
    fn test_ledger_errors_map_to_distinct_statuses() {
        let cases = [
            (LedgerError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (LedgerError::NoActiveModel, StatusCode::NOT_FOUND),
            (LedgerError::SystemPaused, StatusCode::CONFLICT),
            (
                LedgerError::ArithmeticOverflow("mint"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::InsufficientShares {
                    requested: 2,
                    available: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::Ledger(err).status(), status);
        }
    }

    #[test]
    fn test_range_code_is_preserved() {
        let err: AppError = ServiceError::Ledger(LedgerError::InvalidRange {
            reason: RangeError::ToOutOfRange,
            from: 1,
            to: 9,
            count: 3,
        })
        .into();
        assert_eq!(err.code(), "INVALID_RANGE_TO");
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err: AppError = ServiceError::CorruptJournal("bad".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL");
    }
}
