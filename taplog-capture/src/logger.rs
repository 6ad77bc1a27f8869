//! Fire-and-forget delivery of log entries to the message bus.
//!
//! Publishing is best-effort instrumentation: a delivery failure is
//! recorded to the local diagnostic sink and swallowed, never surfaced to
//! the request path and never retried here. At-least-once delivery, where
//! wanted, is the broker's job once it has accepted the message.

use crate::builder::EntryBuilder;
use crate::context::{RequestContext, ResponseOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use taplog_bus::{MessageBus, codec};
use taplog_core::{LogEntry, MetricsCollector, TaplogError};
use tracing::{debug, error};

/// Tag key identifying the producing service instance.
pub const COMPONENT_TAG: &str = "component";

/// The capture pipeline as seen by a request-processing host.
#[async_trait]
pub trait RequestLogger: Send + Sync {
    /// Capture one handled request. Never fails and never blocks the
    /// request path on delivery problems.
    async fn log(
        &self,
        ctx: Option<&RequestContext>,
        response: Option<&ResponseOutcome>,
        duration: Duration,
    );

    /// Read-back is deliberately unsupported: history must come from a
    /// downstream store attached to the bus, never from this component.
    fn latest_entries(&self, take: Option<usize>) -> Result<Vec<LogEntry>, TaplogError>;
}

/// [`RequestLogger`] that publishes entries to a message bus.
pub struct BusRequestLogger {
    builder: EntryBuilder,
    bus: Arc<dyn MessageBus>,
    component: String,
    metrics: Arc<MetricsCollector>,
}

impl BusRequestLogger {
    pub fn new(
        builder: EntryBuilder,
        bus: Arc<dyn MessageBus>,
        component: impl Into<String>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            builder,
            bus,
            component: component.into(),
            metrics,
        }
    }

    /// Deliver one entry, attaching the component tag. Best-effort: the
    /// producer channel is scoped to this call and released on every exit
    /// path, and any failure becomes a diagnostic event while the call
    /// returns normally.
    pub async fn publish(&self, mut entry: LogEntry) {
        entry
            .tags
            .insert(COMPONENT_TAG.to_string(), self.component.clone());
        let payload = match codec::encode_entry(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_publish_failure();
                error!(error = %e, id = entry.id, "Failed to encode log entry");
                return;
            }
        };

        match self.bus.producer().await {
            Ok(mut producer) => match producer.send(payload).await {
                Ok(()) => {
                    self.metrics.record_published();
                    debug!(id = entry.id, "Log entry published");
                }
                Err(e) => {
                    self.metrics.record_publish_failure();
                    error!(error = %e, id = entry.id, "Failed to publish log entry");
                }
            },
            Err(e) => {
                self.metrics.record_publish_failure();
                error!(error = %e, id = entry.id, "Failed to acquire bus producer");
            }
        }
    }
}

#[async_trait]
impl RequestLogger for BusRequestLogger {
    async fn log(
        &self,
        ctx: Option<&RequestContext>,
        response: Option<&ResponseOutcome>,
        duration: Duration,
    ) {
        let Some(entry) = self.builder.build(ctx, response, duration) else {
            return;
        };
        self.publish(entry).await;
    }

    fn latest_entries(&self, _take: Option<usize>) -> Result<Vec<LogEntry>, TaplogError> {
        Err(TaplogError::read_back_unsupported())
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use taplog_bus::{BusError, MemoryBus, MessageProducer, MessageStream};
    use taplog_core::RedactionPolicy;

    fn logger_on(bus: Arc<dyn MessageBus>, policy: RedactionPolicy) -> BusRequestLogger {
        let builder = EntryBuilder::new(policy, Arc::new(AtomicU64::new(0)));
        BusRequestLogger::new(
            builder,
            bus,
            "test-host",
            Arc::new(MetricsCollector::disabled()),
        )
    }

    fn hello_ctx() -> RequestContext {
        let mut ctx = RequestContext::new(
            "GET",
            "http://localhost/hello/alice",
            "/hello/alice",
            "127.0.0.1:51000",
        );
        ctx.kind = Some("hello".into());
        ctx
    }

    // ── Happy path ───────────────────────────────────────────────

    #[tokio::test]
    async fn published_entry_carries_the_component_tag() {
        let bus = Arc::new(MemoryBus::new(16));
        let mut sub = bus.subscribe().await.unwrap();
        let logger = logger_on(bus.clone(), RedactionPolicy::default());

        logger
            .log(Some(&hello_ctx()), None, Duration::from_millis(12))
            .await;

        let payload = sub.next().await.unwrap().unwrap();
        let entry = codec::decode_entry(&payload).unwrap();
        assert_eq!(entry.tags.get(COMPONENT_TAG).map(String::as_str), Some("test-host"));
        assert_eq!(entry.http_method.as_deref(), Some("GET"));
        assert_eq!(entry.id, 1);
    }

    #[tokio::test]
    async fn excluded_request_publishes_nothing() {
        let bus = Arc::new(MemoryBus::new(16));
        let mut sub = bus.subscribe().await.unwrap();
        let logger = logger_on(
            bus.clone(),
            RedactionPolicy {
                exclude_kinds: std::collections::HashSet::from(["hello".to_string()]),
                ..Default::default()
            },
        );

        logger.log(Some(&hello_ctx()), None, Duration::ZERO).await;

        // A sentinel record proves nothing arrived before it.
        let mut producer = bus.producer().await.unwrap();
        producer
            .send(bytes::Bytes::from_static(b"sentinel"))
            .await
            .unwrap();
        assert_eq!(
            sub.next().await.unwrap().unwrap(),
            bytes::Bytes::from_static(b"sentinel")
        );
    }

    // ── Failure swallowing ───────────────────────────────────────

    struct RefusingBus;

    #[async_trait]
    impl MessageBus for RefusingBus {
        async fn producer(&self) -> Result<Box<dyn MessageProducer>, BusError> {
            Err(BusError::Closed)
        }
        async fn subscribe(&self) -> Result<Box<dyn MessageStream>, BusError> {
            Err(BusError::Closed)
        }
    }

    struct FailingProducerBus;
    struct FailingProducer;

    #[async_trait]
    impl MessageProducer for FailingProducer {
        async fn send(&mut self, _payload: bytes::Bytes) -> Result<(), BusError> {
            Err(BusError::Send("broker unreachable".into()))
        }
    }

    #[async_trait]
    impl MessageBus for FailingProducerBus {
        async fn producer(&self) -> Result<Box<dyn MessageProducer>, BusError> {
            Ok(Box::new(FailingProducer))
        }
        async fn subscribe(&self) -> Result<Box<dyn MessageStream>, BusError> {
            Err(BusError::Closed)
        }
    }

    #[tokio::test]
    async fn producer_acquisition_failure_is_swallowed() {
        let logger = logger_on(Arc::new(RefusingBus), RedactionPolicy::default());
        // Must return normally — no panic, no error surfaced.
        logger.log(Some(&hello_ctx()), None, Duration::ZERO).await;
    }

    #[tokio::test]
    async fn send_failure_is_swallowed_and_counted() {
        let builder = EntryBuilder::new(RedactionPolicy::default(), Arc::new(AtomicU64::new(0)));
        let metrics = Arc::new(MetricsCollector::new(true).unwrap());
        let logger = BusRequestLogger::new(
            builder,
            Arc::new(FailingProducerBus),
            "test-host",
            metrics.clone(),
        );

        logger.log(Some(&hello_ctx()), None, Duration::ZERO).await;

        assert_eq!(metrics.publish_failures_total.as_ref().unwrap().get(), 1);
        assert_eq!(metrics.entries_published_total.as_ref().unwrap().get(), 0);
    }

    #[tokio::test]
    async fn successful_publish_is_counted() {
        let bus = Arc::new(MemoryBus::new(16));
        let _sub = bus.subscribe().await.unwrap();
        let builder = EntryBuilder::new(RedactionPolicy::default(), Arc::new(AtomicU64::new(0)));
        let metrics = Arc::new(MetricsCollector::new(true).unwrap());
        let logger = BusRequestLogger::new(builder, bus, "test-host", metrics.clone());

        logger.log(Some(&hello_ctx()), None, Duration::ZERO).await;

        assert_eq!(metrics.entries_published_total.as_ref().unwrap().get(), 1);
    }

    // ── Read-back sentinel ───────────────────────────────────────

    #[tokio::test]
    async fn latest_entries_is_always_unsupported() {
        let logger = logger_on(Arc::new(MemoryBus::new(16)), RedactionPolicy::default());
        for take in [None, Some(0), Some(10)] {
            match logger.latest_entries(take) {
                Err(TaplogError::Unsupported(_)) => {}
                other => panic!("expected unsupported, got {other:?}"),
            }
        }
    }
}
