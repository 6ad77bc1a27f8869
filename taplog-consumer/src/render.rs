//! Reference handler: render received entries to diagnostic output.

use crate::listener::EntryHandler;
use std::sync::Arc;
use taplog_core::LogEntry;
use tracing::info;

/// Render an entry as pretty-printed JSON.
pub fn render_entry(entry: &LogEntry) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(entry)?)
}

/// Handler that dumps every received entry to the diagnostic log, the
/// reference deployment's behavior.
pub fn console_handler() -> EntryHandler {
    Arc::new(|entry| {
        let text = render_entry(entry)?;
        info!(id = entry.id, "Received log entry:\n{text}");
        Ok(())
    })
}
