//! In-process bus over a bounded broadcast channel.
//!
//! Delivery is at-most-once: records published while no subscriber exists
//! are dropped, and a subscriber that falls behind loses the oldest
//! records (reported once as [`BusError::Lagged`]).

use crate::bus::{BusError, MessageBus, MessageProducer, MessageStream};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

/// Process-local [`MessageBus`] used by tests and the reference deployment.
pub struct MemoryBus {
    tx: broadcast::Sender<Bytes>,
}

impl MemoryBus {
    /// Create a bus that retains up to `capacity` undelivered records per
    /// subscriber before dropping the oldest.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn producer(&self) -> Result<Box<dyn MessageProducer>, BusError> {
        Ok(Box::new(MemoryProducer {
            tx: self.tx.clone(),
        }))
    }

    async fn subscribe(&self) -> Result<Box<dyn MessageStream>, BusError> {
        Ok(Box::new(MemoryStream {
            rx: self.tx.subscribe(),
        }))
    }
}

struct MemoryProducer {
    tx: broadcast::Sender<Bytes>,
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn send(&mut self, payload: Bytes) -> Result<(), BusError> {
        // No subscriber attached: the record is dropped, not an error
        // (at-most-once delivery).
        if self.tx.receiver_count() == 0 {
            return Ok(());
        }
        self.tx
            .send(payload)
            .map(|_| ())
            .map_err(|e| BusError::Send(e.to_string()))
    }
}

struct MemoryStream {
    rx: broadcast::Receiver<Bytes>,
}

#[async_trait]
impl MessageStream for MemoryStream {
    async fn next(&mut self) -> Option<Result<Bytes, BusError>> {
        match self.rx.recv().await {
            Ok(payload) => Some(Ok(payload)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(Err(BusError::Lagged(n))),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
