//! Upload session value and the server's rejection body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-issued identity of one upload attempt for one resource.
///
/// Never mutated locally; expiry and completion are observed only through
/// later server responses. Fields the client does not model are kept in
/// `metadata` so the value round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    #[serde(rename = "SessionId")]
    pub session_id: String,
    /// 0 on the wire means "absent"; the negotiator fills in the requested id.
    #[serde(rename = "ResourceId", default)]
    pub resource_id: i64,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl UploadSession {
    pub fn new(session_id: impl Into<String>, resource_id: i64) -> Self {
        Self {
            session_id: session_id.into(),
            resource_id,
            metadata: BTreeMap::new(),
        }
    }
}

/// Body of a 400 response to session creation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
}

/// Extracts `ErrorCode` from a rejection body. Missing, null or unparseable gives `None`.
pub(crate) fn parse_error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_keeps_unknown_fields() {
        let json = r#"{"SessionId":"abc","ResourceId":7,"ExpiresAt":"2026-01-01T00:00:00Z"}"#;
        let s: UploadSession = serde_json::from_str(json).unwrap();
        assert_eq!(s.session_id, "abc");
        assert_eq!(s.resource_id, 7);
        assert_eq!(
            s.metadata.get("ExpiresAt"),
            Some(&serde_json::Value::String("2026-01-01T00:00:00Z".into()))
        );
        let back: UploadSession =
            serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn session_without_resource_id() {
        let s: UploadSession = serde_json::from_str(r#"{"SessionId":"x"}"#).unwrap();
        assert_eq!(s.resource_id, 0);
        assert!(s.metadata.is_empty());
    }

    #[test]
    fn error_code_present() {
        assert_eq!(
            parse_error_code(r#"{"ErrorCode":"QUOTA_EXCEEDED"}"#).as_deref(),
            Some("QUOTA_EXCEEDED")
        );
    }

    #[test]
    fn error_code_absent_null_or_garbage() {
        assert!(parse_error_code(r#"{"Message":"nope"}"#).is_none());
        assert!(parse_error_code(r#"{"ErrorCode":null}"#).is_none());
        assert!(parse_error_code("<html>bad</html>").is_none());
        assert!(parse_error_code("").is_none());
    }
}
