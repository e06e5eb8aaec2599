use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

#[utoipa::path(get, path = "/healthz", tag = "health", responses((status = 200, description = "Service is up", body = String)))]
pub async fn healthz() -> &'static str {
    "ok"
}
