//! Account service
//!
//! Registration, login and profile maintenance. Passwords are only ever
//! hashed here; hashes supplied by clients are ignored.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::TokenIssuer;
use crate::domain::aggregates::{NewUser, ProfileUpdate, Registration, User, UserView};
use crate::domain::value_objects::Email;
use crate::ports::{Notifier, UserStore};
use crate::{Result, ShopError, StoreError};

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserView,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, notifier: Arc<dyn Notifier>, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self { users, notifier, tokens, bcrypt_cost }
    }

    pub async fn register(&self, registration: Registration) -> Result<User> {
        let email = registration.email.as_str().to_string();
        match self.users.get_by_email(&email).await {
            Ok(_) => return Err(ShopError::EmailTaken(email)),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(ShopError::StoreUnavailable(e.to_string())),
        }

        let password_hash = hash_password(registration.password.clone(), self.bcrypt_cost).await?;
        let new_user = NewUser::from_registration(registration, password_hash, Utc::now());
        let user = self.users.create(new_user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration.
            StoreError::Conflict(_) => ShopError::EmailTaken(email.clone()),
            other => ShopError::StoreUnavailable(other.to_string()),
        })?;
        info!(user_id = %user.id, "user registered");

        if let Err(e) = self.notifier.send_registration_confirmation(&user).await {
            warn!(user_id = %user.id, error = %e, "failed to send registration email");
        }
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = Email::parse(email).map_err(|_| ShopError::InvalidCredentials)?;
        let user = self.users.get_by_email(email.as_str()).await.map_err(|e| match e {
            StoreError::NotFound => ShopError::InvalidCredentials,
            other => ShopError::StoreUnavailable(other.to_string()),
        })?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(ShopError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user).map_err(|e| ShopError::Internal(e.to_string()))?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { token, user: user.into() })
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.users.get_user(id).await.map_err(|e| user_store_error(id, e))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        let email = Email::parse(email).map_err(|e| ShopError::InvalidInput(e.to_string()))?;
        self.users.get_by_email(email.as_str()).await.map_err(|e| user_store_error(email.as_str(), e))
    }

    /// Copy the owner-editable fields onto the stored profile found by email.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let mut user = self.get_by_email(update.email.as_str()).await?;
        user.apply(update);
        user.updated_at = Utc::now();
        let user = self.users.update(user).await.map_err(|e| match e {
            StoreError::NotFound => ShopError::not_found("user", "profile"),
            other => ShopError::StoreUnavailable(other.to_string()),
        })?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.users.delete(id).await.map_err(|e| user_store_error(id, e))?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn user_store_error(key: &str, e: StoreError) -> ShopError {
    match e {
        StoreError::NotFound => ShopError::not_found("user", key),
        other => ShopError::StoreUnavailable(other.to_string()),
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ShopError::Internal(e.to_string()))?
        .map_err(|e| ShopError::Internal(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ShopError::Internal(e.to_string()))?
        .map_err(|e| ShopError::Internal(e.to_string()))
}
