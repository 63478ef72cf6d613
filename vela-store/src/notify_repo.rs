use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use vela_core::notify::{
    Audience, Notification, NotificationEvent, NotificationFeed, NotificationSink, NotifyError,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Persisted notification inboxes: one feed for back-office staff, one per
/// vendor. Write side is the `NotificationSink` collaborator; read side
/// serves the unread feeds.
pub struct PgNotificationInbox {
    pool: PgPool,
}

impl PgNotificationInbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn render_message(event: &NotificationEvent) -> String {
    match event {
        NotificationEvent::OrderPlaced(e) => format!(
            "Order {} placed by {} across {} vendor(s)",
            e.order_id,
            e.customer_id,
            e.vendor_ids.len()
        ),
        NotificationEvent::OrderReady(e) => {
            format!("Order {} is ready: all vendors have finished", e.order_id)
        }
        NotificationEvent::OrderDelivered(e) => format!("Order {} delivered", e.order_id),
        NotificationEvent::CancellationRequested(e) => format!(
            "Customer {} requested cancellation of order {}",
            e.customer_id, e.order_id
        ),
        NotificationEvent::CancellationResolved(e) => format!(
            "Cancellation of order {} was {}",
            e.order_id,
            if e.approved { "approved" } else { "denied" }
        ),
        NotificationEvent::LowStock(e) => format!(
            "{} is low on stock ({} left)",
            e.product_name, e.remaining_quantity
        ),
    }
}

fn audience_columns(audience: &Audience) -> (&'static str, Option<&str>) {
    match audience {
        Audience::Admin => ("ADMIN", None),
        Audience::Vendor(vendor_id) => ("VENDOR", Some(vendor_id.as_str())),
    }
}

#[async_trait]
impl NotificationSink for PgNotificationInbox {
    async fn emit(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let audience = event.audience();
        let (audience_kind, vendor_id) = audience_columns(&audience);
        sqlx::query(
            "INSERT INTO notifications \
             (id, audience, vendor_id, kind, message, order_id, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(audience_kind)
        .bind(vendor_id)
        .bind(event.kind())
        .bind(render_message(&event))
        .bind(event.order_id())
        .execute(&self.pool)
        .await
        .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

fn notification_from_row(row: &sqlx::postgres::PgRow) -> Result<Notification, BoxError> {
    let audience_kind: String = row.try_get("audience")?;
    let vendor_id: Option<String> = row.try_get("vendor_id")?;
    let audience = match (audience_kind.as_str(), vendor_id) {
        ("VENDOR", Some(vendor_id)) => Audience::Vendor(vendor_id),
        _ => Audience::Admin,
    };
    Ok(Notification {
        id: row.try_get("id")?,
        audience,
        kind: row.try_get("kind")?,
        message: row.try_get("message")?,
        order_id: row.try_get("order_id")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationFeed for PgNotificationInbox {
    async fn unread(&self, audience: Audience) -> Result<Vec<Notification>, BoxError> {
        let (audience_kind, vendor_id) = audience_columns(&audience);
        let rows = sqlx::query(
            "SELECT id, audience, vendor_id, kind, message, order_id, is_read, created_at \
             FROM notifications \
             WHERE audience = $1 AND vendor_id IS NOT DISTINCT FROM $2 AND is_read = FALSE \
             ORDER BY created_at DESC",
        )
        .bind(audience_kind)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), BoxError> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_shared::models::events::LowStockEvent;

    #[test]
    fn low_stock_messages_name_the_product() {
        let event = NotificationEvent::LowStock(LowStockEvent {
            product_id: Uuid::new_v4(),
            product_name: "Ceylon Tea 500g".to_string(),
            vendor_id: "vendor-7".to_string(),
            remaining_quantity: 3,
            timestamp: 0,
        });
        assert_eq!(
            render_message(&event),
            "Ceylon Tea 500g is low on stock (3 left)"
        );
        assert_eq!(audience_columns(&event.audience()).0, "VENDOR");
    }
}
