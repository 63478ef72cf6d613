use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use chrono::Utc;
use vela_core::notify::{NotificationEvent, NotificationSink};
use vela_shared::models::events::{OrderDeliveredEvent, OrderReadyEvent};

use crate::error::OrderError;
use crate::models::{OrderStatus, VendorStatus};
use crate::status;
use crate::store::{OrderStore, StoreError};

/// Retry budget for the optimistic read-modify-write cycle. Conflicts past
/// the last attempt surface as `OrderError::Conflict`.
pub(crate) const CAS_MAX_ATTEMPTS: u32 = 4;
pub(crate) const CAS_BACKOFF_BASE_MS: u64 = 20;

pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(CAS_BACKOFF_BASE_MS << attempt)
}

/// Applies vendor status changes to order items and keeps the derived order
/// status consistent. Also carries the staff-side delivery confirmation.
pub struct FulfillmentService {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn NotificationSink>,
}

impl FulfillmentService {
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { store, notifier }
    }

    /// Set one item's vendor status and persist the re-aggregated order
    /// status in the same write. Returns the new order-level status.
    ///
    /// The item must belong to `vendor_id`; vendors cannot touch each
    /// other's lines. Lost CAS races are retried with exponential backoff.
    pub async fn set_item_status(
        &self,
        order_id: Uuid,
        vendor_id: &str,
        item_index: usize,
        new_status: VendorStatus,
    ) -> Result<OrderStatus, OrderError> {
        for attempt in 0..CAS_MAX_ATTEMPTS {
            let stored = self.store.get(order_id).await?;
            let mut order = stored.value;

            if order.status.is_terminal() {
                return Err(OrderError::InvalidState(format!(
                    "Order {} is {:?} and no longer accepts vendor updates",
                    order_id, order.status
                )));
            }

            {
                let item = order.items.get_mut(item_index).ok_or_else(|| {
                    OrderError::NotFound(format!("Order {order_id} has no item {item_index}"))
                })?;
                if item.vendor_id != vendor_id {
                    return Err(OrderError::Forbidden(format!(
                        "Item {item_index} of order {order_id} does not belong to vendor {vendor_id}"
                    )));
                }
                item.vendor_status = new_status;
            }

            let previous = order.status;
            order.status = status::aggregate(previous, &order.vendor_statuses())?;

            match self.store.cas_put(&order, stored.revision).await {
                Ok(_) => {
                    tracing::info!(
                        %order_id,
                        vendor_id,
                        item_index,
                        status = ?order.status,
                        "Vendor status applied"
                    );
                    if previous != OrderStatus::VendorReady
                        && order.status == OrderStatus::VendorReady
                    {
                        self.notify(NotificationEvent::OrderReady(OrderReadyEvent {
                            order_id,
                            customer_id: order.customer_id.clone(),
                            timestamp: Utc::now().timestamp(),
                        }))
                        .await;
                    }
                    return Ok(order.status);
                }
                Err(StoreError::RevisionConflict(_)) => {
                    tracing::debug!(%order_id, attempt, "CAS conflict, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(OrderError::Conflict(format!(
            "Order {order_id} kept changing underneath the update"
        )))
    }

    /// Staff confirmation that the order left the building. Only legal from
    /// `VendorReady`; the aggregator never promotes to `Delivered` on its
    /// own.
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<OrderStatus, OrderError> {
        for attempt in 0..CAS_MAX_ATTEMPTS {
            let stored = self.store.get(order_id).await?;
            let mut order = stored.value;

            if order.status.is_terminal() {
                return Err(OrderError::InvalidState(format!(
                    "Order {} is already {:?}",
                    order_id, order.status
                )));
            }
            if order.status != OrderStatus::VendorReady {
                return Err(OrderError::InvalidTransition(format!(
                    "Cannot deliver order {} while it is {:?}",
                    order_id, order.status
                )));
            }

            order.status = OrderStatus::Delivered;

            match self.store.cas_put(&order, stored.revision).await {
                Ok(_) => {
                    tracing::info!(%order_id, "Order marked delivered");
                    self.notify(NotificationEvent::OrderDelivered(OrderDeliveredEvent {
                        order_id,
                        customer_id: order.customer_id.clone(),
                        timestamp: Utc::now().timestamp(),
                    }))
                    .await;
                    return Ok(order.status);
                }
                Err(StoreError::RevisionConflict(_)) => {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(OrderError::Conflict(format!(
            "Order {order_id} kept changing underneath the update"
        )))
    }

    async fn notify(&self, event: NotificationEvent) {
        if let Err(err) = self.notifier.emit(event).await {
            tracing::warn!(error = %err, "Notification emit failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, OrderItem};
    use crate::store::{MemoryOrderStore, Versioned};
    use crate::test_support::RecordingSink;
    use async_trait::async_trait;

    fn order_with_vendors(vendors: &[&str]) -> Order {
        let items = vendors
            .iter()
            .map(|v| {
                OrderItem::new(
                    Uuid::new_v4(),
                    format!("Product of {v}"),
                    v.to_string(),
                    1,
                    1000,
                )
                .unwrap()
            })
            .collect();
        Order::place(
            "cust-1".to_string(),
            items,
            "12 Harbor Lane, Colombo".to_string(),
            "CARD".to_string(),
        )
        .unwrap()
    }

    async fn service_with(
        order: &Order,
    ) -> (FulfillmentService, Arc<MemoryOrderStore>, Arc<RecordingSink>) {
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(order).await.unwrap();
        let sink = Arc::new(RecordingSink::default());
        let service = FulfillmentService::new(store.clone(), sink.clone());
        (service, store, sink)
    }

    #[tokio::test]
    async fn second_vendor_going_ready_completes_the_order() {
        let order = order_with_vendors(&["vendor-a", "vendor-b"]);
        let (service, _, sink) = service_with(&order).await;

        let status = service
            .set_item_status(order.id, "vendor-a", 0, VendorStatus::Ready)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::PartiallyDelivered);

        let status = service
            .set_item_status(order.id, "vendor-b", 1, VendorStatus::Ready)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::VendorReady);

        // Exactly one admin notification, for the VendorReady transition.
        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "ORDER_READY");
    }

    #[tokio::test]
    async fn single_item_order_goes_straight_to_vendor_ready() {
        let order = order_with_vendors(&["vendor-a"]);
        let (service, _, _) = service_with(&order).await;

        let status = service
            .set_item_status(order.id, "vendor-a", 0, VendorStatus::Ready)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::VendorReady);
    }

    #[tokio::test]
    async fn vendors_cannot_touch_each_others_items() {
        let order = order_with_vendors(&["vendor-a", "vendor-b"]);
        let (service, store, _) = service_with(&order).await;

        let err = service
            .set_item_status(order.id, "vendor-b", 0, VendorStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));

        // Nothing was written.
        assert_eq!(store.get(order.id).await.unwrap().revision, 1);
    }

    #[tokio::test]
    async fn missing_item_index_is_not_found() {
        let order = order_with_vendors(&["vendor-a"]);
        let (service, _, _) = service_with(&order).await;

        let err = service
            .set_item_status(order.id, "vendor-a", 5, VendorStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn terminal_orders_reject_late_vendor_updates_without_writing() {
        let mut order = order_with_vendors(&["vendor-a"]);
        order.status = OrderStatus::Canceled;
        let (service, store, _) = service_with(&order).await;

        let err = service
            .set_item_status(order.id, "vendor-a", 0, VendorStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(_)));

        let stored = store.get(order.id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.value.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn concurrent_vendor_updates_both_land() {
        let order = order_with_vendors(&["vendor-a", "vendor-b"]);
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(&order).await.unwrap();
        let sink = Arc::new(RecordingSink::default());
        let service = Arc::new(FulfillmentService::new(store.clone(), sink));

        let (left, right) = tokio::join!(
            {
                let service = service.clone();
                let id = order.id;
                async move {
                    service
                        .set_item_status(id, "vendor-a", 0, VendorStatus::Ready)
                        .await
                }
            },
            {
                let service = service.clone();
                let id = order.id;
                async move {
                    service
                        .set_item_status(id, "vendor-b", 1, VendorStatus::Ready)
                        .await
                }
            }
        );
        left.unwrap();
        right.unwrap();

        // No lost update: both item flips survived and the aggregate
        // reflects them.
        let stored = store.get(order.id).await.unwrap();
        assert_eq!(stored.value.status, OrderStatus::VendorReady);
        assert!(stored
            .value
            .items
            .iter()
            .all(|i| i.vendor_status == VendorStatus::Ready));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_conflict() {
        struct ContestedStore {
            order: Order,
        }

        #[async_trait]
        impl OrderStore for ContestedStore {
            async fn get(&self, _order_id: Uuid) -> Result<Versioned<Order>, StoreError> {
                Ok(Versioned {
                    value: self.order.clone(),
                    revision: 1,
                })
            }

            async fn cas_put(
                &self,
                order: &Order,
                _expected_revision: u64,
            ) -> Result<u64, StoreError> {
                Err(StoreError::RevisionConflict(order.id))
            }

            async fn insert(&self, _order: &Order) -> Result<u64, StoreError> {
                unreachable!("not used in this test")
            }

            async fn list_by_customer(&self, _c: &str) -> Result<Vec<Order>, StoreError> {
                Ok(vec![])
            }

            async fn list_by_vendor(&self, _v: &str) -> Result<Vec<Order>, StoreError> {
                Ok(vec![])
            }

            async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
                Ok(vec![])
            }
        }

        let order = order_with_vendors(&["vendor-a"]);
        let store = Arc::new(ContestedStore {
            order: order.clone(),
        });
        let sink = Arc::new(RecordingSink::default());
        let service = FulfillmentService::new(store, sink);

        let err = service
            .set_item_status(order.id, "vendor-a", 0, VendorStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
    }

    #[tokio::test]
    async fn delivery_requires_vendor_ready() {
        let order = order_with_vendors(&["vendor-a"]);
        let (service, _, _) = service_with(&order).await;

        let err = service.mark_delivered(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));

        service
            .set_item_status(order.id, "vendor-a", 0, VendorStatus::Ready)
            .await
            .unwrap();
        let status = service.mark_delivered(order.id).await.unwrap();
        assert_eq!(status, OrderStatus::Delivered);

        // Delivered is terminal.
        let err = service.mark_delivered(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(_)));
    }
}
