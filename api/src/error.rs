use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::ErrorResponse;
use thiserror::Error;
use valuation_engine::ValuationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Valuation(ValuationError::Validation(_))
            | ApiError::Valuation(ValuationError::MarketNotFound(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Valuation(ValuationError::MarketData(_)) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Label for the `portfolio_valuations_total` counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Valuation(ValuationError::Validation(_)) | ApiError::BadRequest(_) => {
                "validation"
            }
            ApiError::Valuation(ValuationError::MarketNotFound(_)) => "market_not_found",
            ApiError::Valuation(ValuationError::MarketData(_)) => "upstream",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
