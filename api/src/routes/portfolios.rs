use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use domain::{ErrorResponse, ValuationRequest, ValuationResult};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/portfolios/value", post(value_portfolio))
}

/// Values a crypto portfolio in a fiat currency using live Buda prices.
#[utoipa::path(
    post,
    path = "/api/v1/portfolios/value",
    tag = "portfolios",
    request_body = ValuationRequest,
    responses(
        (status = 200, description = "Valuation succeeded", body = ValuationResult),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 422, description = "Invalid input or market not available", body = ErrorResponse),
        (status = 502, description = "Buda API failed", body = ErrorResponse),
    )
)]
pub async fn value_portfolio(
    State(state): State<AppState>,
    payload: Result<Json<ValuationRequest>, JsonRejection>,
) -> ApiResult<Json<ValuationResult>> {
    let result = valuate(&state, payload).await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => {
            tracing::info!(error = %err, status = err.status().as_u16(), "valuation rejected");
            err.outcome()
        }
    };
    metrics::counter!("portfolio_valuations_total", "outcome" => outcome).increment(1);
    result.map(Json)
}

async fn valuate(
    state: &AppState,
    payload: Result<Json<ValuationRequest>, JsonRejection>,
) -> ApiResult<ValuationResult> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let portfolio = request.portfolio.unwrap_or_default();
    let result = state
        .valuation
        .value(&portfolio, request.fiat_currency.as_deref())
        .await?;
    Ok(result)
}
