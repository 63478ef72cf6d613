use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use chrono::Utc;
use serde::Serialize;
use vela_core::notify::{NotificationEvent, NotificationSink};
use vela_core::stock::{RestockRequest, StockService};
use vela_shared::models::events::{CancellationRequestedEvent, CancellationResolvedEvent};

use crate::error::OrderError;
use crate::fulfillment::{backoff_delay, CAS_MAX_ATTEMPTS};
use crate::models::{Order, OrderStatus};
use crate::store::{OrderStore, StoreError};

/// Upper bound for each individual stock-reversal call. A slow stock backend
/// must not hold the cancellation response hostage.
pub(crate) const RESTOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// One stock reversal that did not go through. The cancellation itself is
/// already committed when these are reported; reversals are retryable on
/// their own.
#[derive(Debug, Clone, Serialize)]
pub struct RestockFailure {
    pub item_index: usize,
    pub product_id: Uuid,
    pub reason: String,
}

/// Result of resolving a cancellation request.
#[derive(Debug, Serialize)]
pub struct CancellationOutcome {
    pub status: OrderStatus,
    pub approved: bool,
    pub restock_failures: Vec<RestockFailure>,
}

/// Customer-requested cancellation, arbitrated by CSR/Admin staff. Approval
/// forces the terminal `Canceled` status and reverses stock for every item;
/// denial clears the request and leaves the aggregated status alone.
pub struct CancellationWorkflow {
    store: Arc<dyn OrderStore>,
    stock: Arc<dyn StockService>,
    notifier: Arc<dyn NotificationSink>,
}

impl CancellationWorkflow {
    pub fn new(
        store: Arc<dyn OrderStore>,
        stock: Arc<dyn StockService>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            stock,
            notifier,
        }
    }

    /// Customer raises the cancellation flag. No duplicate requests, no
    /// requests against terminal orders.
    pub async fn request_cancellation(&self, order_id: Uuid) -> Result<OrderStatus, OrderError> {
        for attempt in 0..CAS_MAX_ATTEMPTS {
            let stored = self.store.get(order_id).await?;
            let mut order = stored.value;

            if order.status.is_terminal() {
                return Err(OrderError::InvalidState(format!(
                    "Order {} is {:?} and cannot be cancelled",
                    order_id, order.status
                )));
            }
            if order.cancellation_requested {
                return Err(OrderError::InvalidState(format!(
                    "Order {order_id} already has a pending cancellation request"
                )));
            }

            order.cancellation_requested = true;

            match self.store.cas_put(&order, stored.revision).await {
                Ok(_) => {
                    tracing::info!(%order_id, "Cancellation requested");
                    self.notify(NotificationEvent::CancellationRequested(
                        CancellationRequestedEvent {
                            order_id,
                            customer_id: order.customer_id.clone(),
                            timestamp: Utc::now().timestamp(),
                        },
                    ))
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

    /// Staff decision on a pending request. Approval commits the terminal
    /// status first and only then attempts the stock reversals: a reversal
    /// failure is reported but never rolls the cancellation back.
    pub async fn resolve_cancellation(
        &self,
        order_id: Uuid,
        approve: bool,
        note: Option<String>,
    ) -> Result<CancellationOutcome, OrderError> {
        for attempt in 0..CAS_MAX_ATTEMPTS {
            let stored = self.store.get(order_id).await?;
            let mut order = stored.value;

            if order.status.is_terminal() {
                return Err(OrderError::InvalidState(format!(
                    "Order {} is already {:?}",
                    order_id, order.status
                )));
            }
            if !order.cancellation_requested {
                return Err(OrderError::InvalidState(format!(
                    "Order {order_id} has no pending cancellation request"
                )));
            }

            order.cancellation_requested = false;
            order.cancellation_note = note.clone();
            if approve {
                order.status = OrderStatus::Canceled;
            }

            match self.store.cas_put(&order, stored.revision).await {
                Ok(_) => {
                    tracing::info!(%order_id, approve, "Cancellation resolved");

                    let restock_failures = if approve {
                        self.reverse_stock(&order).await
                    } else {
                        Vec::new()
                    };

                    self.notify(NotificationEvent::CancellationResolved(
                        CancellationResolvedEvent {
                            order_id,
                            approved: approve,
                            note: note.clone(),
                            timestamp: Utc::now().timestamp(),
                        },
                    ))
                    .await;

                    return Ok(CancellationOutcome {
                        status: order.status,
                        approved: approve,
                        restock_failures,
                    });
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

    /// Return every item's quantity to stock. All items are attempted even
    /// when some fail; the collaborator deduplicates retries by request
    /// identity.
    async fn reverse_stock(&self, order: &Order) -> Vec<RestockFailure> {
        let mut failures = Vec::new();
        for (item_index, item) in order.items.iter().enumerate() {
            let request = RestockRequest {
                order_id: order.id,
                item_index,
                product_id: item.product_id,
                quantity: item.quantity,
            };
            let reason = match tokio::time::timeout(
                RESTOCK_TIMEOUT,
                self.stock.restock(request),
            )
            .await
            {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(_) => "stock reversal timed out".to_string(),
            };
            tracing::warn!(
                order_id = %order.id,
                item_index,
                product_id = %item.product_id,
                %reason,
                "Stock reversal failed"
            );
            failures.push(RestockFailure {
                item_index,
                product_id: item.product_id,
                reason,
            });
        }
        failures
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
    use crate::models::OrderItem;
    use crate::store::MemoryOrderStore;
    use crate::test_support::{RecordingSink, RecordingStock};

    fn two_item_order() -> Order {
        Order::place(
            "cust-1".to_string(),
            vec![
                OrderItem::new(
                    Uuid::new_v4(),
                    "Ceylon Tea 500g".to_string(),
                    "vendor-a".to_string(),
                    2,
                    1500,
                )
                .unwrap(),
                OrderItem::new(
                    Uuid::new_v4(),
                    "Cinnamon Sticks".to_string(),
                    "vendor-b".to_string(),
                    1,
                    1250,
                )
                .unwrap(),
            ],
            "12 Harbor Lane, Colombo".to_string(),
            "CARD".to_string(),
        )
        .unwrap()
    }

    struct Fixture {
        workflow: CancellationWorkflow,
        store: Arc<MemoryOrderStore>,
        stock: Arc<RecordingStock>,
        sink: Arc<RecordingSink>,
    }

    async fn fixture(order: &Order, stock: RecordingStock) -> Fixture {
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(order).await.unwrap();
        let stock = Arc::new(stock);
        let sink = Arc::new(RecordingSink::default());
        let workflow = CancellationWorkflow::new(store.clone(), stock.clone(), sink.clone());
        Fixture {
            workflow,
            store,
            stock,
            sink,
        }
    }

    #[tokio::test]
    async fn duplicate_requests_are_rejected() {
        let order = two_item_order();
        let f = fixture(&order, RecordingStock::default()).await;

        f.workflow.request_cancellation(order.id).await.unwrap();
        let err = f.workflow.request_cancellation(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(_)));
    }

    #[tokio::test]
    async fn requests_against_terminal_orders_are_rejected() {
        let mut order = two_item_order();
        order.status = OrderStatus::Delivered;
        let f = fixture(&order, RecordingStock::default()).await;

        let err = f.workflow.request_cancellation(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(_)));
    }

    #[tokio::test]
    async fn approval_cancels_clears_flag_and_restocks_every_item() {
        let order = two_item_order();
        let f = fixture(&order, RecordingStock::default()).await;

        f.workflow.request_cancellation(order.id).await.unwrap();
        let outcome = f
            .workflow
            .resolve_cancellation(order.id, true, Some("Customer changed their mind".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Canceled);
        assert!(outcome.approved);
        assert!(outcome.restock_failures.is_empty());

        let stored = f.store.get(order.id).await.unwrap().value;
        assert_eq!(stored.status, OrderStatus::Canceled);
        assert!(!stored.cancellation_requested);
        assert_eq!(
            stored.cancellation_note.as_deref(),
            Some("Customer changed their mind")
        );

        let requests = f.stock.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].quantity, 2);
        assert_eq!(requests[1].quantity, 1);
    }

    #[tokio::test]
    async fn restock_failure_does_not_roll_back_the_cancellation() {
        let order = two_item_order();
        let failing = order.items[0].product_id;
        let f = fixture(&order, RecordingStock::failing_for([failing])).await;

        f.workflow.request_cancellation(order.id).await.unwrap();
        let outcome = f
            .workflow
            .resolve_cancellation(order.id, true, None)
            .await
            .unwrap();

        // Both reversals attempted, one reported, status committed anyway.
        assert_eq!(f.stock.requests().await.len(), 2);
        assert_eq!(outcome.restock_failures.len(), 1);
        assert_eq!(outcome.restock_failures[0].product_id, failing);
        assert_eq!(outcome.status, OrderStatus::Canceled);

        let stored = f.store.get(order.id).await.unwrap().value;
        assert_eq!(stored.status, OrderStatus::Canceled);
        assert!(!stored.cancellation_requested);
    }

    #[tokio::test]
    async fn denial_keeps_the_aggregated_status() {
        let mut order = two_item_order();
        order.items[0].vendor_status = crate::models::VendorStatus::Ready;
        order.status = OrderStatus::PartiallyDelivered;
        let f = fixture(&order, RecordingStock::default()).await;

        f.workflow.request_cancellation(order.id).await.unwrap();
        let outcome = f
            .workflow
            .resolve_cancellation(order.id, false, Some("Out of return window".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::PartiallyDelivered);
        assert!(!outcome.approved);
        assert!(f.stock.requests().await.is_empty());

        let stored = f.store.get(order.id).await.unwrap().value;
        assert_eq!(stored.status, OrderStatus::PartiallyDelivered);
        assert!(!stored.cancellation_requested);
        assert_eq!(
            stored.cancellation_note.as_deref(),
            Some("Out of return window")
        );
    }

    #[tokio::test]
    async fn resolving_without_a_pending_request_is_rejected() {
        let order = two_item_order();
        let f = fixture(&order, RecordingStock::default()).await;

        let err = f
            .workflow
            .resolve_cancellation(order.id, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(_)));
    }

    #[tokio::test]
    async fn workflow_emits_request_and_resolution_events() {
        let order = two_item_order();
        let f = fixture(&order, RecordingStock::default()).await;

        f.workflow.request_cancellation(order.id).await.unwrap();
        f.workflow
            .resolve_cancellation(order.id, false, None)
            .await
            .unwrap();

        let kinds: Vec<&str> = f.sink.events().await.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["CANCELLATION_REQUESTED", "CANCELLATION_RESOLVED"]
        );
    }
}
