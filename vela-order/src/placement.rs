use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use vela_catalog::product::{Product, ProductError, ProductRepository};
use vela_core::notify::{NotificationEvent, NotificationSink};
use vela_shared::models::events::{LowStockEvent, OrderPlacedEvent};

use crate::error::OrderError;
use crate::models::{Order, OrderItem};
use crate::store::OrderStore;

/// One requested line of a new order; name, vendor and price are snapshotted
/// from the catalog at placement time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Turns a requested item list into a stored order: validates the lines,
/// checks out stock, snapshots catalog data onto the items.
pub struct PlacementService {
    store: Arc<dyn OrderStore>,
    products: Arc<dyn ProductRepository>,
    notifier: Arc<dyn NotificationSink>,
    low_stock_threshold: i64,
}

impl PlacementService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        products: Arc<dyn ProductRepository>,
        notifier: Arc<dyn NotificationSink>,
        low_stock_threshold: i64,
    ) -> Self {
        Self {
            store,
            products,
            notifier,
            low_stock_threshold,
        }
    }

    pub async fn place_order(
        &self,
        customer_id: String,
        requested: Vec<NewOrderItem>,
        shipping_address: String,
        payment_method: String,
    ) -> Result<Order, OrderError> {
        if requested.is_empty() {
            return Err(OrderError::Validation(
                "An order must contain at least one item".to_string(),
            ));
        }

        // Validate every line against the catalog before touching stock.
        let mut checked_out: Vec<(Product, u32)> = Vec::with_capacity(requested.len());
        for line in &requested {
            let mut product = self
                .products
                .get_product(line.product_id)
                .await
                .map_err(|e| OrderError::Dependency(e.to_string()))?
                .ok_or_else(|| {
                    OrderError::Validation(format!("Unknown product {}", line.product_id))
                })?;

            product
                .adjust_stock(-i64::from(line.quantity), self.low_stock_threshold)
                .map_err(|err| match err {
                    ProductError::InsufficientStock { .. } => {
                        OrderError::Validation(err.to_string())
                    }
                    other => OrderError::Dependency(other.to_string()),
                })?;
            checked_out.push((product, line.quantity));
        }

        let mut items = Vec::with_capacity(checked_out.len());
        for (product, quantity) in &checked_out {
            items.push(OrderItem::new(
                product.id,
                product.name.clone(),
                product.vendor_id.clone(),
                *quantity,
                product.price_cents,
            )?);
        }

        let order = Order::place(customer_id, items, shipping_address, payment_method)?;

        // Persist the stock checkouts, then the order itself.
        for (product, _) in &checked_out {
            self.products
                .update_product(product.id, product)
                .await
                .map_err(|e| OrderError::Dependency(e.to_string()))?;
            if product.is_low_stock {
                self.notify(NotificationEvent::LowStock(LowStockEvent {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    vendor_id: product.vendor_id.clone(),
                    remaining_quantity: product.stock_quantity,
                    timestamp: Utc::now().timestamp(),
                }))
                .await;
            }
        }

        self.store.insert(&order).await?;
        tracing::info!(order_id = %order.id, total_cents = order.total_cents, "Order placed");

        self.notify(NotificationEvent::OrderPlaced(OrderPlacedEvent {
            order_id: order.id,
            customer_id: order.customer_id.clone(),
            total_cents: order.total_cents,
            vendor_ids: order.vendor_ids(),
            timestamp: Utc::now().timestamp(),
        }))
        .await;

        Ok(order)
    }

    async fn notify(&self, event: NotificationEvent) {
        if let Err(err) = self.notifier.emit(event).await {
            tracing::warn!(error = %err, "Notification emit failed");
        }
    }
}
