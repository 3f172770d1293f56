//! Adapters behind the capability traits of [`crate::ports`]
pub mod cache;
pub mod memory;
pub mod nats;
pub mod postgres;
pub mod smtp;
