//! Account routes
//!
//! POST /api/users/register
//! POST /api/users/login
//! GET  /api/users/profile?email=
//! PUT  /api/users/profile/update

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::{ApiError, ApiJson, ApiResult, AppState};
use crate::domain::aggregates::{ProfileUpdate, Registration, UserView};
use crate::domain::value_objects::{Email, Phone, ShippingAddress};
use crate::ShopError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/profile", get(profile))
        .route("/api/users/profile/update", put(update_profile))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "email is malformed"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shipping_address: String,
}

impl RegisterRequest {
    /// Email is lowercased before anything else looks at it. Phone and
    /// address are checked first so they surface with their own codes.
    pub fn into_registration(mut self) -> Result<Registration, ApiError> {
        self.email = self.email.trim().to_lowercase();
        let phone = Phone::parse(self.phone.clone()).map_err(|_| ShopError::InvalidPhone)?;
        let shipping_address = ShippingAddress::parse(self.shipping_address.clone()).map_err(|_| ShopError::InvalidAddress)?;
        self.validate().map_err(|e| ApiError::invalid_input(e.to_string()))?;
        let email = Email::parse(&self.email).map_err(|e| ApiError::invalid_input(e.to_string()))?;

        Ok(Registration {
            username: self.username,
            email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            phone,
            shipping_address,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileQuery {
    email: String,
}

/// Profile fields a client may send. Anything else in the body, including a
/// password hash, is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileBody {
    pub email: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub shipping_address: Option<String>,
}

impl ProfileBody {
    pub fn into_update(self) -> Result<ProfileUpdate, ApiError> {
        let email = Email::parse(&self.email).map_err(|e| ApiError::invalid_input(e.to_string()))?;
        let phone = self.phone.map(Phone::parse).transpose().map_err(|_| ShopError::InvalidPhone)?;
        let shipping_address = self
            .shipping_address
            .map(ShippingAddress::parse)
            .transpose()
            .map_err(|_| ShopError::InvalidAddress)?;
        Ok(ProfileUpdate {
            email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            phone,
            shipping_address,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    user: Option<ProfileBody>,
}

async fn register(State(state): State<AppState>, ApiJson(req): ApiJson<RegisterRequest>) -> ApiResult<Json<Value>> {
    let registration = req.into_registration()?;
    let user = state.accounts.register(registration).await?;
    Ok(Json(json!({ "user": UserView::from(user) })))
}

async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult<Json<Value>> {
    let session = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(json!(session)))
}

async fn profile(State(state): State<AppState>, query: Result<Query<ProfileQuery>, QueryRejection>) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    if query.email.trim().is_empty() {
        return Err(ApiError::invalid_input("Email parameter is required"));
    }
    let user = state.accounts.get_by_email(&query.email).await?;
    Ok(Json(json!({ "user": UserView::from(user) })))
}

async fn update_profile(State(state): State<AppState>, ApiJson(req): ApiJson<UpdateProfileRequest>) -> ApiResult<Json<Value>> {
    let body = req.user.ok_or_else(|| ApiError::invalid_input("User data is required"))?;
    let user = state.accounts.update_profile(body.into_update()?).await?;
    Ok(Json(json!({ "user": UserView::from(user) })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: "erin".into(), email: " Erin@Example.COM".into(), password: "pw".into(),
            first_name: "Erin".into(), last_name: "Hale".into(), phone: "+79001234567".into(),
            shipping_address: "г.Пермь".into(),
        }
    }

    #[test]
    fn test_registration_lowercases_email() {
        let registration = request().into_registration().unwrap();
        assert_eq!(registration.email.as_str(), "erin@example.com");
    }

    #[test]
    fn test_format_codes() {
        let err = RegisterRequest { phone: "89001234567".into(), ..request() }.into_registration().unwrap_err();
        assert_eq!(err.code, "INVALID_PHONE");
        let err = RegisterRequest { shipping_address: "Пермь".into(), ..request() }.into_registration().unwrap_err();
        assert_eq!(err.code, "INVALID_ADDRESS");
        let err = RegisterRequest { email: "erin".into(), ..request() }.into_registration().unwrap_err();
        assert_eq!(err.code, "INVALID_INPUT");
    }

    #[test]
    fn test_profile_body_ignores_hash() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"user":{"email":"Erin@example.com","passwordHash":"x","lastName":"Stone"}}"#).unwrap();
        let update = req.user.unwrap().into_update().unwrap();
        assert_eq!(update.email.as_str(), "erin@example.com");
        assert_eq!(update.last_name.as_deref(), Some("Stone"));
        assert!(update.phone.is_none());
    }
}
