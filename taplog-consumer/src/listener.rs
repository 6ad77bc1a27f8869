//! Standing subscription that receives log entries and dispatches them to
//! a caller-supplied handler.
//!
//! One listener is one long-lived tokio task. A bad message — undecodable
//! payload or a failing handler — is logged locally and the subscription
//! continues. Stopping waits for any in-flight handler invocation to
//! finish before the subscription is released.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use taplog_bus::{BusError, MessageBus, MessageStream, codec};
use taplog_core::{LogEntry, MetricsCollector, TaplogError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Listening,
    Stopping,
}

impl ListenerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ListenerState::Starting,
            2 => ListenerState::Listening,
            3 => ListenerState::Stopping,
            _ => ListenerState::Stopped,
        }
    }
}

/// Per-message handler. Errors are recovered locally; they never
/// terminate the subscription.
pub type EntryHandler = Arc<dyn Fn(&LogEntry) -> anyhow::Result<()> + Send + Sync>;

/// Entry point for starting a listener.
pub struct LogListener;

impl LogListener {
    /// Subscribe to the log stream and start dispatching entries to
    /// `handler` on a dedicated task.
    pub async fn spawn(
        bus: Arc<dyn MessageBus>,
        handler: EntryHandler,
        metrics: Arc<MetricsCollector>,
    ) -> Result<ListenerHandle, TaplogError> {
        let state = Arc::new(AtomicU8::new(ListenerState::Starting as u8));
        let stream = bus
            .subscribe()
            .await
            .map_err(|e| TaplogError::Bus(e.to_string()))?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            stream,
            handler,
            Arc::clone(&state),
            stop_rx,
            metrics,
        ));
        Ok(ListenerHandle {
            state,
            stop: stop_tx,
            task,
        })
    }
}

/// Handle to a running listener. Dropping it without calling
/// [`ListenerHandle::stop`] also shuts the listener down (the stop signal
/// closes), but without waiting for the task to finish; `stop` is the
/// orderly path.
pub struct ListenerHandle {
    state: Arc<AtomicU8>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Current lifecycle state, observable at any time.
    pub fn state(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Signal the listener to stop and wait until it has finished any
    /// in-flight handler invocation and released its subscription. Safe
    /// to call while a handler is mid-dispatch.
    pub async fn stop(self) {
        self.state
            .store(ListenerState::Stopping as u8, Ordering::Release);
        let _ = self.stop.send(true);
        let _ = self.task.await;
        self.state
            .store(ListenerState::Stopped as u8, Ordering::Release);
    }

    /// Read-back is deliberately unsupported on the listener as well:
    /// received entries are dispatched, not retained.
    pub fn latest_entries(&self, _take: Option<usize>) -> Result<Vec<LogEntry>, TaplogError> {
        Err(TaplogError::read_back_unsupported())
    }
}

async fn run_loop(
    mut stream: Box<dyn MessageStream>,
    handler: EntryHandler,
    state: Arc<AtomicU8>,
    mut stop_rx: watch::Receiver<bool>,
    metrics: Arc<MetricsCollector>,
) {
    state.store(ListenerState::Listening as u8, Ordering::Release);
    info!("Log listener started");

    loop {
        // The stop signal is only honored between messages, so a handler
        // that is already running always completes.
        tokio::select! {
            _ = stop_rx.changed() => {
                info!("Log listener stopping");
                break;
            }
            message = stream.next() => match message {
                None => {
                    info!("Log stream closed, listener exiting");
                    break;
                }
                Some(Err(BusError::Lagged(dropped))) => {
                    warn!(dropped, "Listener lagged behind the log stream");
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Transient log stream error");
                }
                Some(Ok(payload)) => {
                    dispatch(&payload, &handler, &metrics);
                }
            }
        }
    }

    // Dropping the stream here releases the subscription only after any
    // in-flight dispatch above has returned.
    drop(stream);
    state.store(ListenerState::Stopped as u8, Ordering::Release);
}

fn dispatch(payload: &[u8], handler: &EntryHandler, metrics: &MetricsCollector) {
    let entry = match codec::decode_entry(payload) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(error = %e, "Discarding undecodable log message");
            return;
        }
    };
    metrics.record_consumed();
    if let Err(e) = handler(&entry) {
        metrics.record_handler_failure();
        warn!(error = %e, id = entry.id, "Log handler failed");
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
