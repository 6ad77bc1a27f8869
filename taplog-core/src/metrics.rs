use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Metrics collector — all counters are gated behind `enabled`.
///
/// When `enabled = false`, no prometheus Registry is created and every
/// record method is a no-op, so the capture hot path carries no metrics
/// overhead.
pub struct MetricsCollector {
    enabled: bool,
    registry: Option<Registry>,
    pub entries_published_total: Option<IntCounter>,
    pub publish_failures_total: Option<IntCounter>,
    pub entries_consumed_total: Option<IntCounter>,
    pub handler_failures_total: Option<IntCounter>,
}

impl MetricsCollector {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let registry = Registry::new();

        let entries_published_total = IntCounter::new(
            "taplog_entries_published_total",
            "Log entries handed to the bus",
        )?;
        let publish_failures_total = IntCounter::new(
            "taplog_publish_failures_total",
            "Log entries dropped on delivery failure",
        )?;
        let entries_consumed_total = IntCounter::new(
            "taplog_entries_consumed_total",
            "Log entries decoded by the listener",
        )?;
        let handler_failures_total = IntCounter::new(
            "taplog_handler_failures_total",
            "Listener handler invocations that failed",
        )?;

        registry.register(Box::new(entries_published_total.clone()))?;
        registry.register(Box::new(publish_failures_total.clone()))?;
        registry.register(Box::new(entries_consumed_total.clone()))?;
        registry.register(Box::new(handler_failures_total.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            entries_published_total: Some(entries_published_total),
            publish_failures_total: Some(publish_failures_total),
            entries_consumed_total: Some(entries_consumed_total),
            handler_failures_total: Some(handler_failures_total),
        })
    }

    /// No-op collector for contexts that never render metrics.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: None,
            entries_published_total: None,
            publish_failures_total: None,
            entries_consumed_total: None,
            handler_failures_total: None,
        }
    }

    #[inline]
    pub fn record_published(&self) {
        if let Some(ref c) = self.entries_published_total {
            c.inc();
        }
    }

    #[inline]
    pub fn record_publish_failure(&self) {
        if let Some(ref c) = self.publish_failures_total {
            c.inc();
        }
    }

    #[inline]
    pub fn record_consumed(&self) {
        if let Some(ref c) = self.entries_consumed_total {
            c.inc();
        }
    }

    #[inline]
    pub fn record_handler_failure(&self) {
        if let Some(ref c) = self.handler_failures_total {
            c.inc();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        if let Some(ref registry) = self.registry {
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            let mut buffer = Vec::new();
            encoder.encode(&metric_families, &mut buffer).unwrap_or(());
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
