use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub customer_id: String,
    pub total_cents: i64,
    pub vendor_ids: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderReadyEvent {
    pub order_id: Uuid,
    pub customer_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderDeliveredEvent {
    pub order_id: Uuid,
    pub customer_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CancellationRequestedEvent {
    pub order_id: Uuid,
    pub customer_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CancellationResolvedEvent {
    pub order_id: Uuid,
    pub approved: bool,
    pub note: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct LowStockEvent {
    pub product_id: Uuid,
    pub product_name: String,
    pub vendor_id: String,
    pub remaining_quantity: i64,
    pub timestamp: i64,
}
