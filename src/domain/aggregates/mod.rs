//! Aggregates module
pub mod order;
pub mod product;
pub mod user;

pub use order::{DraftError, DraftItem, NewOrder, Order, OrderDraft, OrderItem, OrderPatch, OrderStatus, OrderUpdate, UnknownStatus};
pub use product::{Product, ProductError, ProductFilter, ProductInput};
pub use user::{NewUser, ProfileUpdate, Registration, User, UserView, WELCOME_BALANCE};
