//! HTTP/JSON gateway
//!
//! Translates requests into service calls, validates formats at the edge
//! and renders every failure as `{"error", "code"}`.

pub mod error;
mod orders;
mod products;
mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::FromRequest;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{BoxError, Json, Router};
use serde::Serialize;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::{AccountService, CatalogService, OrderService};
pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub cors_origin: HeaderValue,
    pub request_timeout: Duration,
}

/// JSON body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

pub fn router(state: AppState, gateway: GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(gateway.cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .merge(users::router())
        .merge(products::router())
        .merge(orders::router())
        .fallback(unknown_route)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(gateway.request_timeout)),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "shoeshop"}))
}

async fn unknown_route(uri: Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", format!("{method} is not allowed on {}", uri.path()))
}

/// Dropping the handler future cancels every outbound call still in flight.
async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request deadline exceeded");
        return ApiError::timeout();
    }
    tracing::error!(error = %err, "unhandled middleware error");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error")
}
