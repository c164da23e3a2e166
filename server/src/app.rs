use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::{self, DEFAULT_ALLOWED_ORIGIN};
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/generate-map",
            axum::routing::post(routes::maps::generate_map),
        )
        .route(
            "/export-regions",
            axum::routing::post(routes::regions::export_regions),
        )
        .route(
            "/import-regions",
            axum::routing::post(routes::regions::import_regions),
        )
        .route("/health", axum::routing::get(routes::maps::health))
        .layer(cors_layer())
        .with_state(state)
}

/// The frontend runs on a different origin than the API, so the attachment
/// filename header has to be exposed for it to read downloads.
fn cors_layer() -> CorsLayer {
    let configured = config::allowed_origin();
    let origin = HeaderValue::from_str(&configured).unwrap_or_else(|_| {
        warn!("invalid allowed origin {configured:?}, falling back to {DEFAULT_ALLOWED_ORIGIN}");
        HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)
    });

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}
