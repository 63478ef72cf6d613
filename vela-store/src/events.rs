use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use vela_core::notify::{NotificationEvent, NotificationSink, NotifyError};

/// Kafka producer for the order event stream. Telemetry only; the inboxes in
/// `notify_repo` are the system of record for notifications.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    order_topic: String,
}

impl EventProducer {
    pub fn new(brokers: &str, order_topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            order_topic: order_topic.to_string(),
        })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    /// Publish an order lifecycle event to the order topic, keyed by order id
    /// so per-order ordering is preserved within a partition.
    pub async fn publish_order_event(&self, event: &NotificationEvent) {
        let key = event
            .order_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| event.kind().to_string());
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize {} event: {}", event.kind(), e);
                return;
            }
        };
        if let Err(e) = self.publish(&self.order_topic, &key, &payload).await {
            error!("Failed to publish {} event: {}", event.kind(), e);
        }
    }
}

// Kafka is a best-effort telemetry sink: publish failures are logged inside
// `publish_order_event` and never bubble up to the emitting workflow.
#[async_trait]
impl NotificationSink for EventProducer {
    async fn emit(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.publish_order_event(&event).await;
        Ok(())
    }
}
