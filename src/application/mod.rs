//! Application services
pub mod accounts;
pub mod catalog;
pub mod orders;
pub mod seed;

pub use accounts::{AccountService, Session};
pub use catalog::CatalogService;
pub use orders::OrderService;
