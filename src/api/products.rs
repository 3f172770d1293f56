//! Catalog routes

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiJson, ApiResult, AppState};
use crate::domain::aggregates::{ProductFilter, ProductInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product).put(update_product).delete(delete_product))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    category: Option<String>,
    brand: Option<String>,
    q: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn create_product(State(state): State<AppState>, ApiJson(input): ApiJson<ProductInput>) -> ApiResult<Json<Value>> {
    let product = state.catalog.create_product(input).await?;
    Ok(Json(json!({ "product": product })))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let product = state.catalog.get_product(&id).await?;
    Ok(Json(json!({ "product": product })))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Value>> {
    let product = state.catalog.update_product(&id, input).await?;
    Ok(Json(json!({ "product": product })))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    state.catalog.delete_product(&id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// `q` switches to ranked free-text search; otherwise category and brand filter.
async fn list_products(State(state): State<AppState>, params: Result<Query<ListParams>, QueryRejection>) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let products = match non_empty(params.q) {
        Some(q) => state.catalog.search_products(&q).await?,
        None => {
            let filter = ProductFilter { category: non_empty(params.category), brand: non_empty(params.brand) };
            state.catalog.list_products(&filter).await?
        }
    };
    Ok(Json(json!({ "products": products })))
}
