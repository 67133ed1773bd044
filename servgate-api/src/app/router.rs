use std::any::Any;

use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::handlers::{
    handler_404, health, restart_service, service_status, start_service, stop_service,
};
use super::state::AppState;

/// Builds the CORS layer from the configured origin list.
fn build_cors_layer(cors_origins: Vec<String>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    if cors_origins.is_empty() {
        // 未配置 SG_CORS_ORIGINS 时允许任意来源
        base.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(origins)
    }
}

/// A panicking handler becomes a plain 500 instead of a dropped connection.
fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked");
    ApiError::internal().into_response()
}

/// Health check, the four `/servise` actions and a JSON 404 fallback.
pub fn app_router(state: AppState, cors_origins: Vec<String>) -> Router {
    // 鉴权由 gateway 完成，路由层不加中间件
    let service_routes = Router::new()
        .route("/servise/status/:name", get(service_status))
        .route("/servise/start/:name", get(start_service))
        .route("/servise/stop/:name", get(stop_service))
        .route("/servise/restart/:name", get(restart_service));

    Router::new()
        .route("/health", get(health))
        .merge(service_routes)
        .fallback(handler_404)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}
