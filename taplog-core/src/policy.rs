//! Redaction policy — pure configuration deciding what a log entry may
//! contain. No side effects; all fields are fixed at construction.

use std::collections::HashSet;

/// Controls which fields of a [`crate::LogEntry`](crate::entry::LogEntry)
/// are populated by the entry builder.
///
/// Request "kinds" are stable string tags declared by the host for each
/// request (e.g. the matched route name) and compared by equality.
#[derive(Debug, Clone, Default)]
pub struct RedactionPolicy {
    /// Requests of these kinds are never logged at all.
    pub exclude_kinds: HashSet<String>,

    /// Requests of these kinds are logged, but with every body payload
    /// (request payload, raw body, form data) omitted. Intended for
    /// auth/registration style endpoints carrying credentials.
    pub hide_body_kinds: HashSet<String>,

    /// Record error details for failed responses.
    pub enable_error_tracking: bool,

    /// Record the raw request body (for kinds whose body is not hidden).
    pub enable_request_body_tracking: bool,

    /// Record the response payload for successful responses.
    pub enable_response_tracking: bool,

    /// Record the opaque session snapshot.
    pub enable_session_tracking: bool,

    /// Roles allowed to read captured logs. Reserved for a future read
    /// API; the write path never consults it.
    pub required_access_roles: HashSet<String>,
}

impl RedactionPolicy {
    /// Whether requests of `kind` must not produce an entry at all.
    pub fn excludes(&self, kind: &str) -> bool {
        self.exclude_kinds.contains(kind)
    }

    /// Whether body payloads must be omitted for requests of `kind`.
    pub fn hides_body(&self, kind: &str) -> bool {
        self.hide_body_kinds.contains(kind)
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
