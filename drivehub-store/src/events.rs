use drivehub_core::NotificationSink;
use drivehub_shared::BookingEvent;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Publishes booking events to Kafka, one topic per event kind under `topic_prefix`.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    topic_prefix: String,
}

impl EventProducer {
    pub fn new(brokers: &str, topic_prefix: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic_prefix: topic_prefix.to_string(),
        })
    }

    pub fn topic_for(&self, event: &BookingEvent) -> String {
        format!("{}.{}", self.topic_prefix, event.topic())
    }

    pub async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
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
}

impl NotificationSink for EventProducer {
    fn publish(&self, event: BookingEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize booking event");
                return;
            }
        };
        let topic = self.topic_for(&event);
        let key = event.reservation_id().to_string();
        let producer = self.clone();

        // Delivery failures are already logged by `send`.
        tokio::spawn(async move {
            let _ = producer.send(&topic, &key, &payload).await;
        });
    }
}

/// In-process fan-out for deployments without a broker.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<BookingEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastNotifier {
    fn publish(&self, event: BookingEvent) {
        let reservation_id = event.reservation_id();
        let topic = event.topic();
        if self.tx.send(event).is_err() {
            debug!(%reservation_id, topic, "No subscribers for booking event");
        }
    }
}
