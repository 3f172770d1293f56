//! User Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Email, Phone, ShippingAddress};

/// Balance credited on registration.
pub const WELCOME_BALANCE: i64 = 845;

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub registration_date: String,
    pub is_admin: bool,
    pub balance: Decimal,
    pub order_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outward representation of a user. The password hash never leaves the
/// account service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub registration_date: String,
    pub is_admin: bool,
    pub balance: Decimal,
    pub order_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id, username: u.username, email: u.email, first_name: u.first_name, last_name: u.last_name,
            phone: u.phone, shipping_address: u.shipping_address, registration_date: u.registration_date,
            is_admin: u.is_admin, balance: u.balance, order_ids: u.order_ids, created_at: u.created_at, updated_at: u.updated_at,
        }
    }
}

/// Validated registration request.
#[derive(Clone, Debug)]
pub struct Registration {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Phone,
    pub shipping_address: ShippingAddress,
}

/// Fields handed to the store on create; the store issues the id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub registration_date: String,
    pub is_admin: bool,
    pub balance: Decimal,
}

impl NewUser {
    pub fn from_registration(reg: Registration, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            username: reg.username, email: reg.email.into_inner(), password_hash,
            first_name: reg.first_name, last_name: reg.last_name,
            phone: reg.phone.as_str().to_string(), shipping_address: reg.shipping_address.as_str().to_string(),
            registration_date: now.to_rfc3339(), is_admin: false, balance: Decimal::from(WELCOME_BALANCE),
        }
    }

    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id, username: self.username, email: self.email, password_hash: self.password_hash,
            first_name: self.first_name, last_name: self.last_name, phone: self.phone,
            shipping_address: self.shipping_address, registration_date: self.registration_date,
            is_admin: self.is_admin, balance: self.balance, order_ids: vec![], created_at: now, updated_at: now,
        }
    }
}

/// Owner-editable profile fields. Identity, hash, admin flag, balance and
/// order list are not part of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Email,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Phone>,
    pub shipping_address: Option<ShippingAddress>,
}

impl ProfileUpdate {
    pub fn for_email(email: Email) -> Self {
        Self { email, username: None, first_name: None, last_name: None, phone: None, shipping_address: None }
    }
}

impl User {
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(v) = update.username { self.username = v; }
        if let Some(v) = update.first_name { self.first_name = v; }
        if let Some(v) = update.last_name { self.last_name = v; }
        if let Some(v) = update.phone { self.phone = v.as_str().to_string(); }
        if let Some(v) = update.shipping_address { self.shipping_address = v.as_str().to_string(); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "alice".into(), email: Email::parse("Alice@Example.com").unwrap(), password: "secret".into(),
            first_name: "Alice".into(), last_name: "Liddell".into(),
            phone: Phone::parse("+79990001122").unwrap(), shipping_address: ShippingAddress::parse("г.Moscow").unwrap(),
        }
    }

    #[test]
    fn test_registration_defaults() {
        let new_user = NewUser::from_registration(registration(), "hash".into(), Utc::now());
        assert_eq!(new_user.email, "alice@example.com");
        assert_eq!(new_user.balance, Decimal::from(845));
        assert!(!new_user.is_admin);
        let user = new_user.into_user("1".into(), Utc::now());
        assert!(user.order_ids.is_empty());
    }

    #[test]
    fn test_profile_update_keeps_protected_fields() {
        let mut user = NewUser::from_registration(registration(), "hash".into(), Utc::now()).into_user("1".into(), Utc::now());
        user.order_ids.push("o1".into());
        user.apply(ProfileUpdate {
            username: Some("al".into()),
            ..ProfileUpdate::for_email(Email::parse("alice@example.com").unwrap())
        });
        assert_eq!(user.username, "al");
        assert_eq!(user.password_hash, "hash");
        assert_eq!(user.order_ids, vec!["o1".to_string()]);
        assert_eq!(user.balance, Decimal::from(845));
    }

    #[test]
    fn test_view_hides_hash() {
        let user = NewUser::from_registration(registration(), "hash".into(), Utc::now()).into_user("1".into(), Utc::now());
        let json = serde_json::to_value(UserView::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }
}
