use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method, Request},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::{ErrorResponse, ValuationLine, ValuationRequest, ValuationResult};
use metrics::set_global_recorder;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info_span, Level};
use utoipa::OpenApi;

use crate::{
    routes::{health, portfolios},
    state::AppState,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Buda Crypto Portfolio API",
        version = "v1",
        description = "API para valorizar portafolios cripto"
    ),
    paths(health::healthz, portfolios::value_portfolio),
    components(schemas(ValuationRequest, ValuationResult, ValuationLine, ErrorResponse)),
    tags((name = "portfolios"), (name = "health"))
)]
pub struct ApiDoc;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_prometheus_handle() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if let Err(e) = set_global_recorder(recorder) {
                tracing::warn!("Global metrics recorder already installed: {}", e);
            }
            handle
        })
        .clone()
}

async fn metrics_handler() -> impl IntoResponse {
    get_prometheus_handle().render()
}

pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    // 先裝 recorder，避免第一次估值時的 counter 被丟掉
    let _ = get_prometheus_handle();

    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::list([Method::GET, Method::POST, Method::OPTIONS]))
        .allow_headers(AllowHeaders::list(vec![CONTENT_TYPE]))
        .allow_origin(AllowOrigin::list(allowed_origins));

    let request_id_header = axum::http::header::HeaderName::from_static("x-request-id");
    let request_id_for_span = request_id_header.clone();
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(move |request: &Request<_>| {
            let request_id = request
                .headers()
                .get(&request_id_for_span)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("unknown");
            info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let openapi = ApiDoc::openapi();

    Router::<AppState>::new()
        .route("/", get(|| async { "buda portfolio valuation api" }))
        .route("/metrics", get(metrics_handler))
        .route("/api-docs/openapi.json", get(move || async move { Json(openapi) }))
        .merge(health::router())
        .nest("/api", portfolios::router())
        .with_state(state)
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(trace_layer)
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
}
