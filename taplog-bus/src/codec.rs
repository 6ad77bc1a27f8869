//! Wire codec for log records.
//!
//! Records travel as compact JSON using the camelCase field names of
//! [`LogEntry`]. The codec is broker-agnostic; the bus only ever sees
//! opaque bytes.

use bytes::Bytes;
use taplog_core::LogEntry;

/// Encode an entry into its wire representation.
pub fn encode_entry(entry: &LogEntry) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(entry).map(Bytes::from)
}

/// Decode a wire payload back into an entry. Absent optional fields decode
/// as "not present"; unknown fields are ignored.
pub fn decode_entry(payload: &[u8]) -> Result<LogEntry, serde_json::Error> {
    serde_json::from_slice(payload)
}
