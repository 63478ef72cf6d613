use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_shared::pii::Masked;

use crate::error::OrderError;

/// A vendor's own fulfillment flag for one item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorStatus {
    Processing,
    Ready,
}

/// Order-wide fulfillment state. Derived from the item statuses except for
/// the terminal staff-asserted transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    VendorReady,
    PartiallyDelivered,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Terminal statuses freeze the order; no further vendor updates or
    /// recomputation are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }
}

/// One product line within an order, owned by exactly one vendor. Name and
/// price are snapshots taken at placement time; `product_id` stays live so
/// stock can be reversed on cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub vendor_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub vendor_status: VendorStatus,
}

impl OrderItem {
    pub fn new(
        product_id: Uuid,
        product_name: String,
        vendor_id: String,
        quantity: u32,
        unit_price_cents: i64,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::Validation(format!(
                "Quantity must be positive for product {product_name}"
            )));
        }
        if unit_price_cents < 0 {
            return Err(OrderError::Validation(format!(
                "Unit price must be non-negative for product {product_name}"
            )));
        }
        Ok(Self {
            product_id,
            product_name,
            vendor_id,
            quantity,
            unit_price_cents,
            vendor_status: VendorStatus::Processing,
        })
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// A customer purchase spanning one or more vendors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub shipping_address: Masked<String>,
    pub total_cents: i64,
    pub payment_method: String,
    pub ordered_at: DateTime<Utc>,
    pub cancellation_requested: bool,
    pub cancellation_note: Option<String>,
}

impl Order {
    /// Build a fresh order. Every item starts at `Processing` and so does the
    /// order itself; an empty item list is rejected here so the aggregator
    /// never sees one.
    pub fn place(
        customer_id: String,
        items: Vec<OrderItem>,
        shipping_address: String,
        payment_method: String,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::Validation(
                "An order must contain at least one item".to_string(),
            ));
        }
        let total_cents = items.iter().map(OrderItem::line_total_cents).sum();
        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            items,
            status: OrderStatus::Processing,
            shipping_address: Masked::new(shipping_address),
            total_cents,
            payment_method,
            ordered_at: Utc::now(),
            cancellation_requested: false,
            cancellation_note: None,
        })
    }

    /// Distinct vendors with at least one item on this order.
    pub fn vendor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|i| i.vendor_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Item statuses in item order, as input for the aggregator.
    pub fn vendor_statuses(&self) -> Vec<VendorStatus> {
        self.items.iter().map(|i| i.vendor_status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(vendor: &str, quantity: u32, price: i64) -> OrderItem {
        OrderItem::new(
            Uuid::new_v4(),
            "Ceylon Tea 500g".to_string(),
            vendor.to_string(),
            quantity,
            price,
        )
        .unwrap()
    }

    #[test]
    fn placing_an_order_totals_lines_and_starts_processing() {
        let order = Order::place(
            "cust-1".to_string(),
            vec![item("vendor-a", 2, 1500), item("vendor-b", 1, 4000)],
            "12 Harbor Lane, Colombo".to_string(),
            "CARD".to_string(),
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total_cents, 7000);
        assert!(!order.cancellation_requested);
        assert!(order
            .items
            .iter()
            .all(|i| i.vendor_status == VendorStatus::Processing));
    }

    #[test]
    fn empty_orders_are_rejected() {
        let result = Order::place(
            "cust-1".to_string(),
            vec![],
            "addr".to_string(),
            "CARD".to_string(),
        );
        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[test]
    fn zero_quantity_items_are_rejected() {
        let result = OrderItem::new(Uuid::new_v4(), "x".to_string(), "v".to_string(), 0, 100);
        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[test]
    fn vendor_ids_are_deduplicated() {
        let order = Order::place(
            "cust-1".to_string(),
            vec![item("b", 1, 1), item("a", 1, 1), item("b", 2, 1)],
            "addr".to_string(),
            "CASH".to_string(),
        )
        .unwrap();
        assert_eq!(order.vendor_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::VendorReady.is_terminal());
        assert!(!OrderStatus::PartiallyDelivered.is_terminal());
    }
}
