/// Runtime messages exchanged with the popup and options pages
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ignore::IgnoreKind;
use crate::storage::is_truthy;
use crate::tab_data::TabId;

/// A request from a UI page; variants are tried in declaration order
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Request {
    Ignore {
        ignore: bool,
        #[serde(rename = "type")]
        kind: IgnoreKind,
        value: String,
        #[serde(default, rename = "tabId")]
        tab_id: Option<TabId>,
        #[serde(default)]
        url: Option<String>,
    },
    Setup {
        setup: String,
        enable: bool,
    },
    Data {
        data: String,
        #[serde(default)]
        value: Value,
    },
    Extra {
        extra: bool,
    },
    Configs {
        configs: bool,
    },
    Ignored {
        ignored: bool,
    },
}

// A request only selects the branch named by one of these fields when it is truthy.
const SELECTOR_FIELDS: [&str; 5] = ["setup", "data", "extra", "configs", "ignored"];

impl Request {
    pub fn parse(mut value: Value) -> Result<Request, String> {
        if let Value::Object(fields) = &mut value {
            fields.retain(|name, field| {
                !SELECTOR_FIELDS.contains(&name.as_str()) || is_truthy(field)
            });
        }
        serde_json::from_value(value).map_err(|_| "unrecognized request".to_string())
    }

    /// Whether handling this request changes what counts as a duplicate
    pub fn changes_detection(&self) -> bool {
        matches!(self, Request::Ignore { .. } | Request::Setup { .. })
    }
}

/// Acknowledgement sent for requests that return no data
pub fn ack() -> Value {
    json!({ "success": true })
}

/// Serialize a response payload, reporting the failure instead when it cannot be
pub fn to_response<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| error_response(&e.to_string()))
}

pub fn error_response(message: &str) -> Value {
    json!({ "error": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignore_request() {
        let request = Request::parse(json!({
            "type": "host",
            "value": "a.com",
            "ignore": true,
            "tabId": 12,
            "url": "https://a.com/x"
        }))
        .unwrap();

        assert_eq!(
            request,
            Request::Ignore {
                ignore: true,
                kind: IgnoreKind::Host,
                value: "a.com".to_string(),
                tab_id: Some(12),
                url: Some("https://a.com/x".to_string()),
            }
        );
        assert!(request.changes_detection());
    }

    #[test]
    fn test_parse_setup_request() {
        let request = Request::parse(json!({"enable": false, "setup": "windows"})).unwrap();

        assert_eq!(request, Request::Setup { setup: "windows".to_string(), enable: false });
        assert!(request.changes_detection());
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(Request::parse(json!({"configs": true})), Ok(Request::Configs { configs: true }));
        assert_eq!(Request::parse(json!({"ignored": true})), Ok(Request::Ignored { ignored: true }));
        assert_eq!(Request::parse(json!({"extra": true})), Ok(Request::Extra { extra: true }));
        assert!(!Request::Configs { configs: true }.changes_detection());
    }

    #[test]
    fn test_parse_data_request() {
        let request = Request::parse(json!({"data": "color-scheme", "value": "dark"})).unwrap();

        assert_eq!(
            request,
            Request::Data { data: "color-scheme".to_string(), value: json!("dark") }
        );
        assert!(!request.changes_detection());
    }

    #[test]
    fn test_ignore_wins_over_other_fields() {
        let request = Request::parse(json!({
            "type": "url",
            "value": "https://a.com/",
            "ignore": false,
            "configs": true
        }))
        .unwrap();

        assert!(matches!(request, Request::Ignore { ignore: false, .. }));
    }

    #[test]
    fn test_unknown_request() {
        assert!(Request::parse(json!({"hello": "world"})).is_err());
        assert!(Request::parse(json!({"type": "domain", "value": "x", "ignore": true})).is_err());
    }

    #[test]
    fn test_falsy_selectors_are_skipped() {
        assert!(Request::parse(json!({"extra": false})).is_err());
        assert!(Request::parse(json!({"configs": false})).is_err());
        assert!(Request::parse(json!({"setup": "", "enable": true})).is_err());
        assert!(Request::parse(json!({"data": "", "value": 1})).is_err());

        assert_eq!(
            Request::parse(json!({"configs": false, "ignored": true})),
            Ok(Request::Ignored { ignored: true })
        );
    }

    #[test]
    fn test_responses() {
        assert_eq!(ack(), json!({"success": true}));
        assert_eq!(error_response("boom"), json!({"error": "boom"}));
    }
}
