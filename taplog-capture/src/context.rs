//! The host-facing view of one in-flight request/response pair.
//!
//! The host fills a [`RequestContext`] with whatever it knows about the
//! request; the entry builder decides what ends up in the log record.

use serde_json::Value;
use std::collections::HashMap;

/// Request attributes handed to the capture pipeline by the host.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Stable request-kind tag (e.g. the matched route name). Requests
    /// without a declared kind are never excluded from logging, but their
    /// body payloads are not captured either.
    pub kind: Option<String>,
    pub method: String,
    pub uri: String,
    pub path_info: String,
    pub client_address: String,
    pub headers: HashMap<String, String>,
    pub user_auth_id: Option<String>,
    pub session_id: Option<String>,
    /// Host context items; non-string values are stringified into the
    /// entry, nulls as `"(null)"`.
    pub items: HashMap<String, Value>,
    /// Opaque session snapshot, captured only under session tracking.
    pub session: Option<Value>,
    /// Structured request payload, when the host parsed one.
    pub request_payload: Option<Value>,
    pub form_data: Option<HashMap<String, String>>,
    pub raw_body: Option<String>,
}

impl RequestContext {
    pub fn new(
        method: impl Into<String>,
        uri: impl Into<String>,
        path_info: impl Into<String>,
        client_address: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            path_info: path_info.into(),
            client_address: client_address.into(),
            ..Default::default()
        }
    }

    /// Get a request header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == lower)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of the request as seen by the host when capture runs.
#[derive(Debug, Clone)]
pub enum ResponseOutcome {
    /// The request succeeded; the payload is whatever structured response
    /// the host chose to expose (often nothing).
    Success(Option<Value>),
    /// The request failed; the value captures the error details.
    Failure(Value),
}

impl ResponseOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseOutcome::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut ctx = RequestContext::new("GET", "/x", "/x", "127.0.0.1:1");
        ctx.headers
            .insert("X-Forwarded-For".into(), "10.0.0.9".into());
        assert_eq!(ctx.header("x-forwarded-for"), Some("10.0.0.9"));
        assert_eq!(ctx.header("X-FORWARDED-FOR"), Some("10.0.0.9"));
        assert_eq!(ctx.header("referer"), None);
    }

    #[test]
    fn new_context_has_no_kind_and_no_payloads() {
        let ctx = RequestContext::new("GET", "/hello", "/hello", "127.0.0.1:1");
        assert!(ctx.kind.is_none());
        assert!(ctx.request_payload.is_none());
        assert!(ctx.raw_body.is_none());
        assert!(ctx.form_data.is_none());
        assert!(ctx.session.is_none());
    }

    #[test]
    fn outcome_error_detection() {
        assert!(!ResponseOutcome::Success(None).is_error());
        assert!(ResponseOutcome::Failure(serde_json::json!({"status": 500})).is_error());
    }
}
