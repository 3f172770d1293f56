//! Order orchestrator
//!
//! Places orders across the account, catalog and order stores, then
//! announces them on the bus and emails the owner. Only the actor check,
//! pricing and persistence can fail an operation; publication and email are
//! best-effort and only logged.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::aggregates::{NewOrder, Order, OrderDraft, OrderItem, OrderStatus, OrderUpdate, Product, User};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Quantity;
use crate::ports::{AccountReader, CatalogReader, EventPublisher, Notifier, OrderStore};
use crate::{Result, ShopError, StoreError};

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogReader>,
    accounts: Arc<dyn AccountReader>,
    publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogReader>,
        accounts: Arc<dyn AccountReader>,
        publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { orders, catalog, accounts, publisher, notifier }
    }

    /// Validate, price and persist a draft, then announce and confirm it.
    pub async fn create_order(&self, draft: OrderDraft) -> Result<Order> {
        let lines = draft.validate().map_err(|e| ShopError::InvalidOrder(e.to_string()))?;

        let owner = self.accounts.get_user(&draft.user_id).await.map_err(|e| match e {
            StoreError::NotFound => ShopError::ActorUnknown(draft.user_id.clone()),
            other => ShopError::UpstreamUnavailable(other.to_string()),
        })?;

        let items = self.price(&lines).await?;

        let new_order = NewOrder::pending(draft.user_id.clone(), items, draft.shipping_address, draft.payment_method);
        let order = self
            .orders
            .create(new_order)
            .await
            .map_err(|e| ShopError::StoreUnavailable(e.to_string()))?;
        info!(order_id = %order.id, user_id = %order.user_id, total = %order.total_amount, "order created");

        if let Err(e) = self.accounts.attach_order(&order.user_id, &order.id).await {
            warn!(order_id = %order.id, user_id = %order.user_id, error = %e, "failed to record order on user");
        }
        self.announce(DomainEvent::Order(OrderEvent::Created(order.clone()))).await;
        if let Err(e) = self.notifier.send_order_confirmation(&owner.email, &order).await {
            warn!(order_id = %order.id, error = %e, "failed to send order confirmation email");
        }

        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        self.orders.get(id).await.map_err(|e| order_store_error(id, e))
    }

    /// Orders of one user, newest first.
    pub async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        self.orders
            .list_by_user(user_id)
            .await
            .map_err(|e| ShopError::StoreUnavailable(e.to_string()))
    }

    /// Change the mutable fields of an order: shipping address, payment
    /// method and payment id. Items, owner and total are fixed at creation;
    /// status only moves through [`OrderService::update_order_status`].
    pub async fn update_order(&self, id: &str, changes: OrderUpdate) -> Result<Order> {
        let current = self.get_order(id).await?;
        if let Some(status) = changes.status.filter(|s| *s != current.status) {
            return Err(ShopError::BadTransition { from: current.status, to: status });
        }
        if changes.user_id.as_ref().is_some_and(|u| *u != current.user_id)
            || changes.items.as_ref().is_some_and(|i| *i != current.items)
            || changes.total_amount.is_some_and(|t| t != current.total_amount)
        {
            return Err(ShopError::InvalidOrder("items, owner and total cannot change after creation".into()));
        }

        // Never writes status; transitions only go through the compare-and-set.
        let updated = self.orders.update(id, &changes.patch()).await.map_err(|e| order_store_error(id, e))?;
        info!(order_id = %updated.id, "order updated");

        self.announce(DomainEvent::Order(OrderEvent::Updated(updated.clone()))).await;
        Ok(updated)
    }

    /// Move an order one step along the status machine.
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        let current = self.get_order(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(ShopError::BadTransition { from: current.status, to: status });
        }

        let updated = self.orders.update_status(id, current.status, status).await.map_err(|e| match e {
            // Someone else moved the order between our read and write.
            StoreError::Conflict(_) => ShopError::BadTransition { from: current.status, to: status },
            other => order_store_error(id, other),
        })?;
        info!(order_id = %id, from = %current.status, to = %status, "order status changed");

        self.announce(DomainEvent::Order(OrderEvent::StatusChanged { order_id: id.to_string(), status })).await;
        if let Some(owner) = self.owner_of(&updated).await {
            if let Err(e) = self.notifier.send_order_status_update(&owner.email, &updated).await {
                warn!(order_id = %id, error = %e, "failed to send order status update email");
            }
        }
        Ok(updated)
    }

    /// Remove an order record. No event is published for deletions.
    pub async fn delete_order(&self, id: &str) -> Result<()> {
        self.orders.delete(id).await.map_err(|e| order_store_error(id, e))?;
        info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Price every line at the current catalog price and check stock.
    /// Repeated product ids are looked up once; every line is still checked.
    async fn price(&self, lines: &[(String, Quantity)]) -> Result<Vec<OrderItem>> {
        let mut snapshot: HashMap<&str, Product> = HashMap::new();
        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product_id = product_id.as_str();
            if !snapshot.contains_key(product_id) {
                let product = self.catalog.get_product(product_id).await.map_err(|e| match e {
                    StoreError::NotFound => ShopError::ProductUnknown(product_id.to_string()),
                    other => ShopError::UpstreamUnavailable(other.to_string()),
                })?;
                snapshot.insert(product_id, product);
            }
            let product = &snapshot[product_id];
            if i64::from(product.stock) < i64::from(quantity.value()) {
                return Err(ShopError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity.value(),
                    available: product.stock,
                });
            }
            items.push(OrderItem { product_id: product_id.to_string(), quantity: quantity.value(), price: product.price });
        }
        Ok(items)
    }

    async fn announce(&self, event: DomainEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(subject = event.subject(), order_id = event.entity_id(), error = %e, "failed to publish order event");
        }
    }

    /// Secondary read used only to address notifications.
    async fn owner_of(&self, order: &Order) -> Option<User> {
        match self.accounts.get_user(&order.user_id).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(order_id = %order.id, user_id = %order.user_id, error = %e, "cannot resolve order owner for notification");
                None
            }
        }
    }
}

fn order_store_error(id: &str, e: StoreError) -> ShopError {
    match e {
        StoreError::NotFound => ShopError::not_found("order", id),
        other => ShopError::StoreUnavailable(other.to_string()),
    }
}
