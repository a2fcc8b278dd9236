//! The Collins response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The `{status, data}` wrapper Collins returns for every API call.
///
/// `status` is `"success"` (possibly with a suffix such as
/// `"success:created"`) on the happy path, or `"failure:<code>"` otherwise.
/// The `ensure_*` helpers also synthesize envelopes locally; see
/// [`Envelope::exists`] and [`Envelope::failure`]. The `data` payload is
/// passed through as raw JSON with no schema enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Outcome marker; anything prefixed `"success"` is a success.
    pub status: String,
    /// Response payload, opaque to the client.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Whether the status carries the `"success"` prefix.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.starts_with("success")
    }

    /// Synthesized envelope for an idempotent create that hit an existing
    /// record (HTTP 409).
    #[must_use]
    pub fn exists() -> Self {
        Self {
            status: "success:exists".to_string(),
            data: json!({"SUCCESS": true}),
        }
    }

    /// Synthesized envelope for an HTTP error the caller chose not to raise.
    #[must_use]
    pub fn failure(code: u16) -> Self {
        Self {
            status: format!("failure:{code}"),
            data: json!({"SUCCESS": false}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_envelope() {
        let body = r#"{"status":"success:ok","data":{"ASSET":{"TAG":"web-01"}}}"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data["ASSET"]["TAG"], "web-01");
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let envelope: Envelope = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(envelope.is_success());
        assert!(envelope.data.is_null());
    }

    #[test]
    fn exists_is_success() {
        let envelope = Envelope::exists();
        assert_eq!(envelope.status, "success:exists");
        assert!(envelope.is_success());
        assert_eq!(envelope.data["SUCCESS"], true);
    }

    #[test]
    fn failure_carries_code() {
        let envelope = Envelope::failure(503);
        assert_eq!(envelope.status, "failure:503");
        assert!(!envelope.is_success());
        assert_eq!(envelope.data["SUCCESS"], false);
    }
}
