//! Value Objects for accounts and orders

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locality marker every shipping address starts with.
pub const LOCALITY_PREFIX: &str = "г.";

/// Email address, always stored lowercase
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, EmailError> {
        let value = value.as_ref().trim().to_lowercase();
        if value.is_empty() { return Err(EmailError::Empty); }
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self(value)),
            _ => Err(EmailError::Malformed),
        }
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum EmailError { Empty, Malformed }
impl std::error::Error for EmailError {}
impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "email is required"), Self::Malformed => write!(f, "email is malformed") }
    }
}

/// Phone number in international form (leading `+`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    pub fn parse(value: impl Into<String>) -> Result<Self, FormatError> {
        let value = value.into();
        if !value.starts_with('+') { return Err(FormatError::Phone); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// Shipping address starting with the locality prefix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress(String);

impl ShippingAddress {
    pub fn parse(value: impl Into<String>) -> Result<Self, FormatError> {
        let value = value.into();
        if !value.starts_with(LOCALITY_PREFIX) { return Err(FormatError::Address); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum FormatError { Phone, Address }
impl std::error::Error for FormatError {}
impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phone => write!(f, "Phone number must start with '+'"),
            Self::Address => write!(f, "Shipping address must start with '{LOCALITY_PREFIX}'"),
        }
    }
}

/// Ordered quantity, at least one unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Option<Self> {
        u32::try_from(value).ok().filter(|v| *v >= 1).map(Self)
    }
    pub fn value(&self) -> u32 { self.0 }
}
