//! Converts one request/response pair into a [`LogEntry`] under the
//! configured redaction policy.

use crate::context::{RequestContext, ResponseOutcome};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use taplog_core::{LogEntry, RedactionPolicy};

/// Literal recorded for null context items.
const NULL_ITEM: &str = "(null)";

/// Builds log entries with process-unique ids.
///
/// The id counter is injected so that every builder in the process shares
/// one sequence; it is advanced with a single atomic increment, never
/// reset, and never consumed for excluded requests.
pub struct EntryBuilder {
    policy: RedactionPolicy,
    counter: Arc<AtomicU64>,
}

impl EntryBuilder {
    pub fn new(policy: RedactionPolicy, counter: Arc<AtomicU64>) -> Self {
        Self { policy, counter }
    }

    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Produce the entry for one handled request, or `None` when the
    /// request's declared kind is excluded from logging.
    ///
    /// Absent context or response fields are simply omitted; building
    /// never fails.
    pub fn build(
        &self,
        ctx: Option<&RequestContext>,
        response: Option<&ResponseOutcome>,
        duration: Duration,
    ) -> Option<LogEntry> {
        let kind = ctx.and_then(|c| c.kind.as_deref());
        if let Some(kind) = kind {
            if self.policy.excludes(kind) {
                return None;
            }
        }

        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entry = LogEntry::new(id, Utc::now(), duration);

        if let Some(ctx) = ctx {
            entry.http_method = Some(ctx.method.clone());
            entry.uri = Some(ctx.uri.clone());
            entry.path_info = Some(ctx.path_info.clone());
            entry.client_address = Some(ctx.client_address.clone());
            entry.forwarded_for = ctx.header("x-forwarded-for").map(str::to_owned);
            entry.referer = ctx.header("referer").map(str::to_owned);
            entry.headers = ctx.headers.clone();
            entry.user_auth_id = ctx.user_auth_id.clone();
            entry.session_id = ctx.session_id.clone();
            entry.items = stringify_items(&ctx.items);
            if self.policy.enable_session_tracking {
                entry.session = ctx.session.clone();
            }

            // Body payloads require a declared kind outside the hide set.
            let body_allowed = kind.is_some_and(|k| !self.policy.hides_body(k));
            if body_allowed {
                entry.request_payload = ctx.request_payload.clone();
                entry.form_data = ctx.form_data.clone();
                if self.policy.enable_request_body_tracking {
                    entry.raw_request_body = ctx.raw_body.clone();
                }
            }
        }

        match response {
            Some(ResponseOutcome::Success(payload)) => {
                if self.policy.enable_response_tracking {
                    entry.response_payload = payload.clone();
                }
            }
            Some(ResponseOutcome::Failure(error)) => {
                if self.policy.enable_error_tracking {
                    entry.error_payload = Some(error.clone());
                }
            }
            None => {}
        }

        Some(entry)
    }
}

/// Stringify host context items for the wire: nulls become the `"(null)"`
/// token, strings pass through, everything else is compact JSON text.
fn stringify_items(items: &HashMap<String, Value>) -> HashMap<String, String> {
    items
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::Null => NULL_ITEM.to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
