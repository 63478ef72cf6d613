use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stock-reversal request, issued per order item when a cancellation is
/// approved. The (order_id, item_index) pair identifies the reversal so the
/// collaborator can treat a retry of the same reversal as a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestockRequest {
    pub order_id: Uuid,
    pub item_index: usize,
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Stock backend unavailable: {0}")]
    Unavailable(String),
}

/// Stock collaborator consumed by the order core. Implementations must make
/// `restock` idempotent per request identity: reversing the same item twice
/// must not double-credit the product's stock.
#[async_trait]
pub trait StockService: Send + Sync {
    async fn restock(&self, request: RestockRequest) -> Result<(), StockError>;
}
