//! End-to-end tests for the outbox publisher and integration consumer,
//! running against the in-memory broker and stores.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paintworks_core::clock::Clock;
use paintworks_core::envelope::{EventEnvelope, WireMessage, WrapOptions};
use paintworks_core::error::EventError;
use paintworks_core::event::IntegrationEvent;
use paintworks_core::integration::Subscription;
use paintworks_core::outbox::{OutboxBatch, OutboxMessage, OutboxStore};
use paintworks_core::registry::{EventTypeRegistry, EventTypeRegistryBuilder};
use paintworks_messaging::broker::{InMemoryBroker, MessageBroker};
use paintworks_messaging::consumer::{ConsumerConfig, IntegrationConsumer};
use paintworks_messaging::publisher::{OutboxPublisher, PublisherConfig};
use paintworks_test_support::{
    FailingIntegrationHandler, FixedClock, InMemoryInboxStore, InMemoryOutboxStore,
    RecordingIntegrationHandler,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MaterialCreatedV1 {
    material_id: Uuid,
    name: String,
}

impl IntegrationEvent for MaterialCreatedV1 {
    const NAME: &'static str = "materials.material-created";
    const VERSION: i16 = 1;
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap(),
    ))
}

fn registry() -> Arc<EventTypeRegistry> {
    let mut builder = EventTypeRegistryBuilder::new();
    builder.register::<MaterialCreatedV1>().unwrap();
    Arc::new(builder.build())
}

fn seed_message(clock: &dyn Clock, name: &str) -> OutboxMessage {
    let envelope = EventEnvelope::wrap(
        MaterialCreatedV1 {
            material_id: Uuid::new_v4(),
            name: name.to_owned(),
        },
        WrapOptions {
            tenant_id: "studio-7".into(),
            username: "freya".into(),
            correlation_id: Uuid::new_v4(),
            causation_id: None,
            trace: None,
        },
        clock,
    );
    let mut batch = OutboxBatch::new();
    batch.push(&envelope).unwrap();
    batch.messages()[0].clone()
}

fn inventory_subscription(
    handlers: Vec<Arc<dyn paintworks_core::integration::IntegrationEventHandler>>,
) -> Subscription {
    Subscription {
        queue: "inventory".to_owned(),
        bindings: vec!["materials.*.v1".to_owned()],
        handlers,
    }
}

async fn wait_until(deadline: StdDuration, mut condition: impl FnMut() -> bool) -> bool {
    let result = tokio::time::timeout(deadline, async {
        while !condition() {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await;
    result.is_ok()
}

/// A broker that rejects the first `fail_times` publishes, then delegates to
/// an inner in-memory broker.
struct FlakyBroker {
    inner: InMemoryBroker,
    fail_times: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl MessageBroker for FlakyBroker {
    async fn publish(&self, topic: &str, message: &WireMessage) -> Result<(), EventError> {
        use std::sync::atomic::Ordering;
        if self
            .fail_times
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EventError::Broker("broker unavailable".into()));
        }
        self.inner.publish(topic, message).await
    }

    async fn subscribe(
        &self,
        queue: &str,
        bindings: &[String],
    ) -> Result<Box<dyn paintworks_messaging::broker::BrokerSubscription>, EventError> {
        self.inner.subscribe(queue, bindings).await
    }
}

#[tokio::test]
async fn test_end_to_end_outbox_to_handler() {
    let clock = fixed_clock();
    let outbox = Arc::new(InMemoryOutboxStore::new());
    let inbox = Arc::new(InMemoryInboxStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let handler = Arc::new(RecordingIntegrationHandler::new(
        "stock-projector",
        "materials.material-created",
        1,
    ));
    let consumer = IntegrationConsumer::new(
        registry(),
        inbox.clone(),
        clock.clone(),
        inventory_subscription(vec![handler.clone()]),
        ConsumerConfig::default(),
    );
    let consumer_handle = consumer.start(broker.as_ref()).await.unwrap();

    let message = seed_message(clock.as_ref(), "Resin A");
    let event_id = message.id;
    outbox.insert(message);

    let publisher = OutboxPublisher::new(
        outbox.clone(),
        broker,
        clock.clone(),
        PublisherConfig::default(),
    );
    assert_eq!(publisher.publish_due().await.unwrap(), 1);

    assert!(wait_until(StdDuration::from_secs(2), || handler.call_count() == 1).await);

    // Outbox row is terminally processed and the backlog is empty.
    let row = outbox.get(event_id).unwrap();
    assert!(row.processed_utc.is_some());
    let stats = outbox.stats().await.unwrap();
    assert_eq!(stats.unprocessed_count, 0);
    assert!(stats.oldest_unprocessed_utc.is_none());

    // The handler saw the original envelope, and the inbox recorded it.
    let envelope = &handler.envelopes()[0];
    assert_eq!(envelope["payload"]["name"], "Resin A");
    assert!(wait_until(StdDuration::from_secs(1), || inbox.entry_count() == 1).await);

    consumer_handle.shutdown();
    consumer_handle.join().await;
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let clock = fixed_clock();
    let inbox = Arc::new(InMemoryInboxStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let handler = Arc::new(RecordingIntegrationHandler::new(
        "stock-projector",
        "materials.material-created",
        1,
    ));
    let consumer = IntegrationConsumer::new(
        registry(),
        inbox.clone(),
        clock.clone(),
        inventory_subscription(vec![handler.clone()]),
        ConsumerConfig::default(),
    );
    let handle = consumer.start(broker.as_ref()).await.unwrap();

    let message = seed_message(clock.as_ref(), "Resin A");
    let frame = WireMessage {
        event_name: message.event_name.clone(),
        event_version: message.event_version,
        envelope: message.payload.clone(),
    };
    let topic = "materials.material-created.v1";

    // Deliver the identical message twice.
    broker.publish(topic, &frame).await.unwrap();
    broker.publish(topic, &frame).await.unwrap();

    assert!(wait_until(StdDuration::from_secs(2), || inbox.entry_count() == 1).await);
    // Give the second delivery time to flow through before asserting.
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    // Effect applied exactly once; the redundant delivery was a no-op.
    assert_eq!(handler.call_count(), 1);
    assert_eq!(inbox.entry_count(), 1);

    handle.shutdown();
    handle.join().await;
}

#[tokio::test]
async fn test_unknown_event_type_does_not_poison_the_queue() {
    let clock = fixed_clock();
    let inbox = Arc::new(InMemoryInboxStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let handler = Arc::new(RecordingIntegrationHandler::new(
        "stock-projector",
        "materials.material-created",
        1,
    ));
    let consumer = IntegrationConsumer::new(
        registry(),
        inbox.clone(),
        clock.clone(),
        inventory_subscription(vec![handler.clone()]),
        ConsumerConfig::default(),
    );
    let handle = consumer.start(broker.as_ref()).await.unwrap();

    // An event name the registry has never heard of, bound to the same queue.
    let unknown = WireMessage {
        event_name: "materials.unknown-event".to_owned(),
        event_version: 1,
        envelope: serde_json::json!({"payload": {}}),
    };
    broker
        .publish("materials.unknown-event.v1", &unknown)
        .await
        .unwrap();

    // A known message published afterwards is still processed.
    let message = seed_message(clock.as_ref(), "Resin A");
    let frame = WireMessage {
        event_name: message.event_name.clone(),
        event_version: message.event_version,
        envelope: message.payload.clone(),
    };
    broker
        .publish("materials.material-created.v1", &frame)
        .await
        .unwrap();

    assert!(wait_until(StdDuration::from_secs(2), || handler.call_count() == 1).await);

    handle.shutdown();
    handle.join().await;
}

#[tokio::test]
async fn test_publisher_retries_with_exponential_backoff() {
    let clock = fixed_clock();
    let outbox = Arc::new(InMemoryOutboxStore::new());
    let broker = Arc::new(FlakyBroker {
        inner: InMemoryBroker::new(),
        fail_times: std::sync::atomic::AtomicUsize::new(1),
    });

    let message = seed_message(clock.as_ref(), "Resin A");
    let event_id = message.id;
    outbox.insert(message);

    let config = PublisherConfig::default();
    let publisher = OutboxPublisher::new(outbox.clone(), broker, clock.clone(), config);

    // First run: broker down, attempt recorded, retry scheduled.
    assert_eq!(publisher.publish_due().await.unwrap(), 0);
    let row = outbox.get(event_id).unwrap();
    assert_eq!(row.attempts, 1);
    assert!(row.processed_utc.is_none());
    let retry_at = row.do_not_process_before_utc.unwrap();
    assert_eq!(retry_at, clock.now() + config.backoff_base);

    // Still backing off: nothing is due.
    assert_eq!(publisher.publish_due().await.unwrap(), 0);
    assert_eq!(outbox.get(event_id).unwrap().attempts, 1);

    // Past the backoff, the message is retried and goes through.
    clock.advance(Duration::seconds(3));
    assert_eq!(publisher.publish_due().await.unwrap(), 1);
    assert!(outbox.get(event_id).unwrap().processed_utc.is_some());
}

#[tokio::test]
async fn test_crashed_claim_is_republished_after_lease() {
    let clock = fixed_clock();
    let outbox = Arc::new(InMemoryOutboxStore::new());

    let message = seed_message(clock.as_ref(), "Resin A");
    let event_id = message.id;
    outbox.insert(message);

    let config = PublisherConfig::default();

    // Simulate a publisher that claimed the row and crashed before marking
    // it processed: the claim stamped a lease and nothing else happened.
    let claimed = outbox
        .claim_due(config.batch_size, config.claim_lease, clock.now())
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    // Within the lease the row is invisible to other publishers.
    let broker = Arc::new(InMemoryBroker::new());
    let publisher = OutboxPublisher::new(outbox.clone(), broker, clock.clone(), config);
    assert_eq!(publisher.publish_due().await.unwrap(), 0);

    // After the lease expires the row is pending again — no message loss.
    clock.advance(config.claim_lease + Duration::seconds(1));
    assert_eq!(publisher.publish_due().await.unwrap(), 1);
    assert!(outbox.get(event_id).unwrap().processed_utc.is_some());
}

#[tokio::test]
async fn test_handler_failure_nacks_and_redelivery_succeeds() {
    let clock = fixed_clock();
    let inbox = Arc::new(InMemoryInboxStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    let handler = Arc::new(FailingIntegrationHandler::new(
        "stock-projector",
        "materials.material-created",
        1,
        1,
    ));
    let consumer = IntegrationConsumer::new(
        registry(),
        inbox.clone(),
        clock.clone(),
        inventory_subscription(vec![handler.clone()]),
        ConsumerConfig {
            requeue_delay: StdDuration::from_millis(20),
        },
    );
    let handle = consumer.start(broker.as_ref()).await.unwrap();

    let message = seed_message(clock.as_ref(), "Resin A");
    let frame = WireMessage {
        event_name: message.event_name.clone(),
        event_version: message.event_version,
        envelope: message.payload.clone(),
    };
    broker
        .publish("materials.material-created.v1", &frame)
        .await
        .unwrap();

    // First delivery fails and is nacked; the redelivery succeeds and the
    // inbox records the pair.
    assert!(wait_until(StdDuration::from_secs(2), || inbox.entry_count() == 1).await);
    assert_eq!(handler.attempts(), 2);

    handle.shutdown();
    handle.join().await;
}
