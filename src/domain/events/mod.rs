//! Domain events and their bus subjects
use serde::Serialize;

use crate::domain::aggregates::{Order, OrderStatus, Product};

pub mod subjects {
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_UPDATED: &str = "order.updated";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    pub const PRODUCT_CREATED: &str = "product.created";
    pub const PRODUCT_UPDATED: &str = "product.updated";
    pub const PRODUCT_DELETED: &str = "product.deleted";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Order(OrderEvent),
    Product(ProductEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderEvent {
    Created(Order),
    Updated(Order),
    StatusChanged { order_id: String, status: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductEvent {
    Created(Product),
    Updated(Product),
    Deleted { product_id: String },
}

#[derive(Serialize)]
struct StatusChangedPayload<'a> {
    order_id: &'a str,
    status: OrderStatus,
}

#[derive(Serialize)]
struct ProductDeletedPayload<'a> {
    product_id: &'a str,
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Created(_)) => subjects::ORDER_CREATED,
            Self::Order(OrderEvent::Updated(_)) => subjects::ORDER_UPDATED,
            Self::Order(OrderEvent::StatusChanged { .. }) => subjects::ORDER_STATUS_CHANGED,
            Self::Product(ProductEvent::Created(_)) => subjects::PRODUCT_CREATED,
            Self::Product(ProductEvent::Updated(_)) => subjects::PRODUCT_UPDATED,
            Self::Product(ProductEvent::Deleted { .. }) => subjects::PRODUCT_DELETED,
        }
    }

    /// JSON body published on the bus.
    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Order(OrderEvent::Created(order) | OrderEvent::Updated(order)) => serde_json::to_vec(order),
            Self::Order(OrderEvent::StatusChanged { order_id, status }) => {
                serde_json::to_vec(&StatusChangedPayload { order_id, status: *status })
            }
            Self::Product(ProductEvent::Created(product) | ProductEvent::Updated(product)) => serde_json::to_vec(product),
            Self::Product(ProductEvent::Deleted { product_id }) => serde_json::to_vec(&ProductDeletedPayload { product_id }),
        }
    }

    /// Identifier of the entity the event concerns, for log context.
    pub fn entity_id(&self) -> &str {
        match self {
            Self::Order(OrderEvent::Created(o) | OrderEvent::Updated(o)) => &o.id,
            Self::Order(OrderEvent::StatusChanged { order_id, .. }) => order_id,
            Self::Product(ProductEvent::Created(p) | ProductEvent::Updated(p)) => &p.id,
            Self::Product(ProductEvent::Deleted { product_id }) => product_id,
        }
    }
}
