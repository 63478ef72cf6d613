use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Order;

/// A record together with the revision counter the store holds for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub revision: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Revision conflict on order {0}")]
    RevisionConflict(Uuid),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable keyed storage for order records. The document for one order is the
/// unit of mutual exclusion: `cas_put` persists a full snapshot only if the
/// caller's revision still matches, so a read-modify-write sequence is atomic
/// with respect to other writers on the same order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Point lookup, returning the current snapshot and its revision.
    async fn get(&self, order_id: Uuid) -> Result<Versioned<Order>, StoreError>;

    /// Persist `order` if the stored revision equals `expected_revision`;
    /// returns the new revision, or `RevisionConflict` when another writer
    /// got there first.
    async fn cas_put(&self, order: &Order, expected_revision: u64) -> Result<u64, StoreError>;

    /// Insert a freshly placed order at revision 1.
    async fn insert(&self, order: &Order) -> Result<u64, StoreError>;

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, StoreError>;

    /// Orders containing at least one item owned by `vendor_id`.
    async fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;
}

/// In-memory order store. Backs the unit and scenario tests and local demos;
/// the Postgres store in vela-store is the production implementation of the
/// same contract.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Versioned<Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, order_id: Uuid) -> Result<Versioned<Order>, StoreError> {
        let orders = self.orders.read().await;
        orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    async fn cas_put(&self, order: &Order, expected_revision: u64) -> Result<u64, StoreError> {
        let mut orders = self.orders.write().await;
        let entry = orders
            .get_mut(&order.id)
            .ok_or(StoreError::NotFound(order.id))?;
        if entry.revision != expected_revision {
            return Err(StoreError::RevisionConflict(order.id));
        }
        entry.value = order.clone();
        entry.revision += 1;
        Ok(entry.revision)
    }

    async fn insert(&self, order: &Order) -> Result<u64, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Backend(format!(
                "Order {} already exists",
                order.id
            )));
        }
        orders.insert(
            order.id,
            Versioned {
                value: order.clone(),
                revision: 1,
            },
        );
        Ok(1)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|v| v.value.customer_id == customer_id)
            .map(|v| v.value.clone())
            .collect())
    }

    async fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|v| v.value.items.iter().any(|i| i.vendor_id == vendor_id))
            .map(|v| v.value.clone())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.values().map(|v| v.value.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus};

    fn sample_order() -> Order {
        Order::place(
            "cust-1".to_string(),
            vec![OrderItem::new(
                Uuid::new_v4(),
                "Ceylon Tea 500g".to_string(),
                "vendor-a".to_string(),
                1,
                1500,
            )
            .unwrap()],
            "12 Harbor Lane, Colombo".to_string(),
            "CARD".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_at_revision_one() {
        let store = MemoryOrderStore::new();
        let order = sample_order();
        assert_eq!(store.insert(&order).await.unwrap(), 1);

        let stored = store.get(order.id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.value, order);
    }

    #[tokio::test]
    async fn cas_put_rejects_stale_revisions() {
        let store = MemoryOrderStore::new();
        let mut order = sample_order();
        store.insert(&order).await.unwrap();

        order.status = OrderStatus::VendorReady;
        assert_eq!(store.cas_put(&order, 1).await.unwrap(), 2);

        // A writer still holding revision 1 loses.
        let err = store.cas_put(&order, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::RevisionConflict(_)));
    }

    #[tokio::test]
    async fn missing_orders_are_not_found() {
        let store = MemoryOrderStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn vendor_listing_filters_on_item_ownership() {
        let store = MemoryOrderStore::new();
        let order = sample_order();
        store.insert(&order).await.unwrap();

        assert_eq!(store.list_by_vendor("vendor-a").await.unwrap().len(), 1);
        assert!(store.list_by_vendor("vendor-z").await.unwrap().is_empty());
        assert_eq!(store.list_by_customer("cust-1").await.unwrap().len(), 1);
    }
}
