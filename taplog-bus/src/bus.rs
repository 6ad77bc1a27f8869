//! The message bus capability consumed by the capture and listener sides.
//!
//! The broker itself is an external collaborator; this crate only defines
//! the minimal publish/subscribe seam plus the in-process implementation
//! used by tests and single-process deployments. A networked broker client
//! plugs in by implementing [`MessageBus`].

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors surfaced by a bus implementation.
#[derive(Error, Debug)]
pub enum BusError {
    /// The bus (or its backing connection) is gone.
    #[error("bus closed")]
    Closed,

    /// A subscriber fell behind and the given number of messages were
    /// dropped to catch up.
    #[error("subscriber lagged, {0} messages dropped")]
    Lagged(u64),

    /// Delivery was rejected or the channel could not be acquired.
    #[error("send failed: {0}")]
    Send(String),
}

/// A producer channel scoped to a short sequence of sends.
///
/// Producers are acquired per publish call and released by dropping them,
/// on every exit path. Implementations must make `drop` release any broker
/// resources held by the channel.
#[async_trait]
pub trait MessageProducer: Send {
    /// Deliver one wire payload to the bus. May block briefly while the
    /// underlying channel sends.
    async fn send(&mut self, payload: Bytes) -> Result<(), BusError>;
}

/// A standing subscription to the log stream.
///
/// Dropping the subscription releases broker resources.
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next payload. `None` means the stream is closed and no
    /// further messages will arrive. `Some(Err(..))` reports a recoverable
    /// condition (e.g. lag) after which the stream continues.
    async fn next(&mut self) -> Option<Result<Bytes, BusError>>;
}

/// Minimal publish/subscribe capability.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Acquire a producer channel for the scope of one publish call.
    async fn producer(&self) -> Result<Box<dyn MessageProducer>, BusError>;

    /// Open a standing subscription to the log stream.
    async fn subscribe(&self) -> Result<Box<dyn MessageStream>, BusError>;
}
