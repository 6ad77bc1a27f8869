//! The unit of record shared by the producer and consumer sides.
//!
//! A [`LogEntry`] describes one completed request. It is built once by the
//! capture side, published to the message bus, and decoded into an
//! independent copy by whatever consumer is attached to the stream.
//!
//! The wire representation is broker-agnostic JSON with camelCase field
//! names. Every optional field is skipped when absent and defaulted when
//! missing, so consumers decode records from older or newer producers
//! without failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A single request log record, written once per handled request.
///
/// Instances are normally created by the capture-side entry builder, which
/// owns the id counter and applies the redaction policy. An entry is never
/// mutated after it has been handed to the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    // ── Identity ─────────────────────────────────────────────────
    /// Process-local sequence number, strictly increasing and unique
    /// within a process lifetime.
    pub id: u64,
    /// Capture time (UTC), always set.
    pub timestamp: DateTime<Utc>,
    /// Elapsed processing time of the request, always set.
    pub duration: Duration,

    // ── Request ──────────────────────────────────────────────────
    /// HTTP verb (`GET`, `POST`, …). Absent when no request context
    /// was available at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Full request URI including query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Path portion of the URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_info: Option<String>,
    /// Remote peer address as seen by the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    /// Value of the `X-Forwarded-For` header, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_for: Option<String>,
    /// Value of the `Referer` header, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Request headers. Keys are unique; ordering is irrelevant.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    // ── Identity extracted from context ──────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    // ── Context data ─────────────────────────────────────────────
    /// Host context items, stringified. Null values are recorded as the
    /// literal token `"(null)"`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub items: HashMap<String, String>,
    /// Opaque session snapshot; only present when session tracking is
    /// enabled by the redaction policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<serde_json::Value>,

    // ── Payloads (population governed by the redaction policy) ───
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_payload: Option<serde_json::Value>,

    // ── Labels ───────────────────────────────────────────────────
    /// Free-form labels. The publisher sets `tags["component"]` to the
    /// configured component/source tag before delivery.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl LogEntry {
    /// Create a minimal entry with only the always-present fields set;
    /// the builder fills the rest according to context and policy.
    pub fn new(id: u64, timestamp: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id,
            timestamp,
            duration,
            http_method: None,
            uri: None,
            path_info: None,
            client_address: None,
            forwarded_for: None,
            referer: None,
            headers: HashMap::new(),
            user_auth_id: None,
            session_id: None,
            items: HashMap::new(),
            session: None,
            request_payload: None,
            response_payload: None,
            raw_request_body: None,
            form_data: None,
            error_payload: None,
            tags: HashMap::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
