use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vela_shared::models::events::{
    CancellationRequestedEvent, CancellationResolvedEvent, LowStockEvent, OrderDeliveredEvent,
    OrderPlacedEvent, OrderReadyEvent,
};

/// Which inbox a notification lands in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
    Admin,
    Vendor(String),
}

/// Events the order core and catalog emit toward the notification
/// collaborator. Delivery guarantees are the collaborator's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    OrderPlaced(OrderPlacedEvent),
    OrderReady(OrderReadyEvent),
    OrderDelivered(OrderDeliveredEvent),
    CancellationRequested(CancellationRequestedEvent),
    CancellationResolved(CancellationResolvedEvent),
    LowStock(LowStockEvent),
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::OrderPlaced(_) => "ORDER_PLACED",
            NotificationEvent::OrderReady(_) => "ORDER_READY",
            NotificationEvent::OrderDelivered(_) => "ORDER_DELIVERED",
            NotificationEvent::CancellationRequested(_) => "CANCELLATION_REQUESTED",
            NotificationEvent::CancellationResolved(_) => "CANCELLATION_RESOLVED",
            NotificationEvent::LowStock(_) => "LOW_STOCK",
        }
    }

    /// Routing: order lifecycle events go to the admin feed, stock alerts to
    /// the owning vendor's feed.
    pub fn audience(&self) -> Audience {
        match self {
            NotificationEvent::LowStock(e) => Audience::Vendor(e.vendor_id.clone()),
            _ => Audience::Admin,
        }
    }

    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            NotificationEvent::OrderPlaced(e) => Some(e.order_id),
            NotificationEvent::OrderReady(e) => Some(e.order_id),
            NotificationEvent::OrderDelivered(e) => Some(e.order_id),
            NotificationEvent::CancellationRequested(e) => Some(e.order_id),
            NotificationEvent::CancellationResolved(e) => Some(e.order_id),
            NotificationEvent::LowStock(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),
}

/// Notification collaborator. Fire-and-forget from the caller's perspective;
/// callers log failures instead of propagating them.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, event: NotificationEvent) -> Result<(), NotifyError>;
}

/// Broadcasts every event to a set of sinks. One sink failing does not stop
/// the others; the first error is reported after all sinks were tried.
pub struct FanoutSink {
    sinks: Vec<std::sync::Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    async fn emit(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.emit(event.clone()).await {
                tracing::warn!(error = %err, kind = event.kind(), "Notification sink failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// A notification as it sits in an inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub audience: Audience,
    pub kind: String,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Read side of the notification inboxes (admin feed, per-vendor feeds).
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    async fn unread(
        &self,
        audience: Audience,
    ) -> Result<Vec<Notification>, Box<dyn std::error::Error + Send + Sync>>;

    async fn mark_read(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
