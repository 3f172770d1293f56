//! Gateway tests driving the router in-process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use shoeshop::api::{router, AppState, GatewayConfig};
use shoeshop::application::{AccountService, CatalogService, OrderService};
use shoeshop::auth::TokenIssuer;
use shoeshop::domain::aggregates::{Product, ProductFilter};
use shoeshop::infrastructure::memory::{
    MemoryOrderStore, MemoryProductStore, MemoryUserStore, RecordingNotifier, RecordingPublisher,
};
use shoeshop::ports::{CatalogReader, ProductStore};
use shoeshop::StoreError;

fn app_with(products: Arc<dyn ProductStore>, request_timeout: Duration) -> Router {
    let users = Arc::new(MemoryUserStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let catalog = Arc::new(CatalogService::new(products, None, publisher.clone()));
    let accounts = Arc::new(AccountService::new(users.clone(), notifier.clone(), TokenIssuer::new("test-secret", 1), 4));
    let orders = Arc::new(OrderService::new(Arc::new(MemoryOrderStore::default()), catalog.clone(), users, publisher, notifier));
    let gateway = GatewayConfig { cors_origin: HeaderValue::from_static("http://localhost:3000"), request_timeout };
    router(AppState { accounts, catalog, orders }, gateway)
}

fn app() -> Router {
    app_with(Arc::new(MemoryProductStore::default()), Duration::from_secs(5))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn registration() -> Value {
    json!({
        "username": "olga",
        "email": "Olga@Example.com",
        "password": "s3cret",
        "firstName": "Olga",
        "lastName": "Ivanova",
        "phone": "+79991112233",
        "shippingAddress": "г.Москва, ул. Тверская 1"
    })
}

async fn register(app: &Router) -> Value {
    let (status, body) = call(app, Method::POST, "/api/users/register", Some(registration())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["user"].clone()
}

async fn create_product(app: &Router, price: &str, stock: i32) -> Value {
    let product = json!({
        "name": "Air Max", "brand": "Nike", "category": "running", "description": "cushioned runner",
        "price": price, "stock": stock, "sizes": ["40", "41", "42"], "colors": ["white"], "images": []
    });
    let (status, body) = call(app, Method::POST, "/api/products", Some(product)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["product"].clone()
}

#[tokio::test]
async fn health() {
    let (status, body) = call(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_normalizes_and_hides_hash() {
    let app = app();
    let user = register(&app).await;
    assert_eq!(user["email"], "olga@example.com");
    assert_eq!(user["isAdmin"], false);
    assert_eq!(user["balance"], "845");
    assert!(user.get("passwordHash").is_none());

    let (status, body) = call(&app, Method::POST, "/api/users/register", Some(registration())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn register_rejects_bad_formats() {
    let app = app();
    let mut bad_phone = registration();
    bad_phone["phone"] = json!("89991112233");
    let (status, body) = call(&app, Method::POST, "/api/users/register", Some(bad_phone)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Phone number must start with '+'", "code": "INVALID_PHONE"}));

    let mut bad_address = registration();
    bad_address["shippingAddress"] = json!("Москва");
    let (status, body) = call(&app, Method::POST, "/api/users/register", Some(bad_address)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn login_and_profile() {
    let app = app();
    let user = register(&app).await;

    let (status, body) =
        call(&app, Method::POST, "/api/users/login", Some(json!({"email": "OLGA@example.com", "password": "s3cret"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["id"], user["id"]);

    let (status, body) =
        call(&app, Method::POST, "/api/users/login", Some(json!({"email": "olga@example.com", "password": "nope"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = call(&app, Method::GET, "/api/users/profile?email=OLGA%40example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "olga");

    let (status, _) = call(&app, Method::GET, "/api/users/profile?email=ghost%40example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::GET, "/api/users/profile", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_keeps_protected_fields() {
    let app = app();
    let user = register(&app).await;
    let update = json!({"user": {
        "email": "olga@example.com", "lastName": "Petrova", "isAdmin": true, "balance": "100000", "passwordHash": "x"
    }});
    let (status, body) = call(&app, Method::PUT, "/api/users/profile/update", Some(update)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["lastName"], "Petrova");
    assert_eq!(body["user"]["isAdmin"], false);
    assert_eq!(body["user"]["balance"], user["balance"]);

    let (status, _) =
        call(&app, Method::POST, "/api/users/login", Some(json!({"email": "olga@example.com", "password": "s3cret"}))).await;
    assert_eq!(status, StatusCode::OK);

    let bad = json!({"user": {"email": "olga@example.com", "phone": "8800"}});
    let (status, body) = call(&app, Method::PUT, "/api/users/profile/update", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PHONE");
}

#[tokio::test]
async fn product_lifecycle() {
    let app = app();
    let product = create_product(&app, "129.99", 4).await;
    assert_eq!(product["sizes"], json!(["40", "41", "42"]));
    let id = product["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Air Max");

    let (_, body) = call(&app, Method::GET, "/api/products?brand=Nike&category=running", None).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
    let (_, body) = call(&app, Method::GET, "/api/products?brand=Adidas", None).await;
    assert!(body["products"].as_array().unwrap().is_empty());
    let (_, body) = call(&app, Method::GET, "/api/products?q=cushioned", None).await;
    assert_eq!(body["products"][0]["id"], id.as_str());

    let (status, body) = call(&app, Method::PUT, &format!("/api/products/{id}"), Some(json!({"name": "Air Max 90", "price": "99.50", "stock": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"], "99.50");
    assert_eq!(body["product"]["createdAt"], product["createdAt"]);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn order_flow() {
    let app = app();
    let user = register(&app).await;
    let product = create_product(&app, "100.00", 5).await;
    let draft = json!({
        "userId": user["id"],
        "items": [{"productId": product["id"], "quantity": 2, "price": 1}],
        "shippingAddress": "г.Moscow",
        "paymentMethod": "card"
    });

    let (status, body) = call(&app, Method::POST, "/api/orders", Some(draft)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = body["order"].clone();
    assert_eq!(order["totalAmount"], "200.00");
    assert_eq!(order["status"], "PENDING");
    let id = order["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::PUT, &format!("/api/orders/{id}/status"), Some(json!({"status": "PAID"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated successfully");

    let (status, body) = call(&app, Method::PUT, &format!("/api/orders/{id}/status"), Some(json!({"status": "PENDING"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_TRANSITION");

    let (status, body) = call(&app, Method::PUT, &format!("/api/orders/{id}/status"), Some(json!({"status": "LOST"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (_, body) = call(&app, Method::GET, &format!("/api/orders/user/{}", user["id"].as_str().unwrap()), None).await;
    assert_eq!(body["orders"][0]["status"], "PAID");

    let mut change = body["orders"][0].clone();
    change["paymentId"] = json!("pay_1");
    let (status, body) = call(&app, Method::PUT, &format!("/api/orders/{id}"), Some(change)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["paymentId"], "pay_1");

    let (status, body) = call(&app, Method::PUT, &format!("/api/orders/{id}"), Some(json!({"paymentMethod": "cash"}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["paymentMethod"], "cash");
    assert_eq!(body["order"]["paymentId"], "pay_1");
    assert_eq!(body["order"]["status"], "PAID");
    assert_eq!(body["order"]["totalAmount"], "200.00");
}

#[tokio::test]
async fn order_errors() {
    let app = app();
    let user = register(&app).await;
    create_product(&app, "10.00", 1).await;

    let (status, body) = call(&app, Method::GET, "/api/orders/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let draft = json!({"userId": user["id"], "items": [{"productId": "p999", "quantity": 1}], "shippingAddress": "г.Moscow"});
    let (status, body) = call(&app, Method::POST, "/api/orders", Some(draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRODUCT_UNKNOWN");

    let draft = json!({"userId": user["id"], "items": []});
    let (_, body) = call(&app, Method::POST, "/api/orders", Some(draft)).await;
    assert_eq!(body["code"], "INVALID_ORDER");
}

#[tokio::test]
async fn malformed_json_uses_envelope() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unrouted_requests_use_envelope() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "no route for /api/nope");

    let (status, body) = call(&app, Method::PATCH, "/api/products", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    assert!(body["error"].as_str().is_some_and(|msg| msg.contains("PATCH")));
}

#[tokio::test]
async fn cors_preflight() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/orders")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
}

/// Catalog whose reads outlive the request deadline.
struct SlowCatalog(MemoryProductStore);

#[async_trait]
impl CatalogReader for SlowCatalog {
    async fn get_product(&self, id: &str) -> Result<Product, StoreError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.0.get_product(id).await
    }
}

#[async_trait]
impl ProductStore for SlowCatalog {
    async fn create(&self, product: Product) -> Result<Product, StoreError> { self.0.create(product).await }
    async fn update(&self, product: Product) -> Result<Product, StoreError> { self.0.update(product).await }
    async fn delete(&self, id: &str) -> Result<(), StoreError> { self.0.delete(id).await }
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> { self.0.list(filter).await }
    async fn search(&self, query: &str) -> Result<Vec<Product>, StoreError> { self.0.search(query).await }
}

#[tokio::test]
async fn slow_upstream_hits_deadline() {
    let app = app_with(Arc::new(SlowCatalog(MemoryProductStore::default())), Duration::from_millis(50));
    let (status, body) = call(&app, Method::GET, "/api/products/p1", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "TIMEOUT");
}
