//! Shared fakes for the collaborator traits, used by the unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

use vela_core::notify::{NotificationEvent, NotificationSink, NotifyError};
use vela_core::stock::{RestockRequest, StockError, StockService};

/// Captures every emitted notification for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn emit(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Records restock requests and fails for a configurable set of products.
#[derive(Default)]
pub struct RecordingStock {
    requests: Mutex<Vec<RestockRequest>>,
    failing_products: HashSet<Uuid>,
}

impl RecordingStock {
    pub fn failing_for(products: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failing_products: products.into_iter().collect(),
        }
    }

    pub async fn requests(&self) -> Vec<RestockRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl StockService for RecordingStock {
    async fn restock(&self, request: RestockRequest) -> Result<(), StockError> {
        self.requests.lock().await.push(request.clone());
        if self.failing_products.contains(&request.product_id) {
            return Err(StockError::Unavailable(format!(
                "injected failure for {}",
                request.product_id
            )));
        }
        Ok(())
    }
}
