//! Order routes
//!
//! POST /api/orders
//! GET  /api/orders/:id
//! PUT  /api/orders/:id
//! GET  /api/orders/user/:userId
//! PUT  /api/orders/:id/status

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiJson, ApiResult, AppState};
use crate::domain::aggregates::{OrderDraft, OrderStatus, OrderUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/:id", get(get_order).put(update_order))
        .route("/api/orders/user/:user_id", get(list_user_orders))
        .route("/api/orders/:id/status", put(update_order_status))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    #[serde(default)]
    status: String,
}

async fn create_order(State(state): State<AppState>, ApiJson(draft): ApiJson<OrderDraft>) -> ApiResult<Json<Value>> {
    let order = state.orders.create_order(draft).await?;
    Ok(Json(json!({ "order": order })))
}

async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let order = state.orders.get_order(&id).await?;
    Ok(Json(json!({ "order": order })))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<OrderUpdate>,
) -> ApiResult<Json<Value>> {
    let order = state.orders.update_order(&id, changes).await?;
    Ok(Json(json!({ "order": order })))
}

async fn list_user_orders(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Value>> {
    let orders = state.orders.list_orders(&user_id).await?;
    Ok(Json(json!({ "orders": orders })))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Value>> {
    let status = req.status.parse::<OrderStatus>().map_err(|e| ApiError::invalid_input(e.to_string()))?;
    state.orders.update_order_status(&id, status).await?;
    Ok(Json(json!({ "message": "Order status updated successfully" })))
}
