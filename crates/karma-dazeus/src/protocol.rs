//! DaZeus plugin protocol messages.

use karma_core::error::{KarmaError, KarmaResult};
use karma_core::types::Scope;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Plugin protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 1;

/// Event name for chat messages.
pub const PRIVMSG: &str = "PRIVMSG";

/// An event pushed by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    pub params: Vec<String>,
}

impl Event {
    /// Recognise an event frame. Non-string parameters are stringified.
    pub fn from_frame(frame: &Value) -> Option<Self> {
        let event = frame.get("event")?.as_str()?.to_string();
        let params = frame
            .get("params")
            .and_then(Value::as_array)
            .map(|params| params.iter().map(value_to_string).collect())
            .unwrap_or_default();
        Some(Self { event, params })
    }

    pub fn is_privmsg(&self) -> bool {
        self.event.eq_ignore_ascii_case(PRIVMSG)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scope_param(scope: &Scope) -> Value {
    match scope.network_name() {
        Some(network) => json!([network]),
        None => json!([]),
    }
}

/// Request builders.
pub mod request {
    use super::*;

    pub fn handshake(name: &str, version: &str, config_group: &str) -> Value {
        json!({
            "do": "handshake",
            "params": [name, version, PROTOCOL_VERSION, config_group],
        })
    }

    pub fn subscribe(events: &[&str]) -> Value {
        json!({ "do": "subscribe", "params": events })
    }

    pub fn message(network: &str, target: &str, text: &str) -> Value {
        json!({ "do": "message", "params": [network, target, text] })
    }

    pub fn get_property(key: &str, scope: &Scope) -> Value {
        json!({
            "do": "property",
            "params": ["get", key],
            "scope": scope_param(scope),
        })
    }

    pub fn set_property(key: &str, value: &str, scope: &Scope) -> Value {
        json!({
            "do": "property",
            "params": ["set", key, value],
            "scope": scope_param(scope),
        })
    }

    pub fn unset_property(key: &str, scope: &Scope) -> Value {
        json!({
            "do": "property",
            "params": ["unset", key],
            "scope": scope_param(scope),
        })
    }
}

/// Turn a response frame into an error when the core refused the request.
pub fn check_success(response: Value) -> KarmaResult<Value> {
    match response.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(response),
        _ => {
            let reason = response
                .get("error")
                .map(value_to_string)
                .unwrap_or_else(|| "request failed without an error message".to_string());
            Err(KarmaError::rejected(reason))
        }
    }
}

/// The `value` of a property response; absent or null means unset.
pub fn property_value(response: &Value) -> Option<String> {
    match response.get("value") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value_to_string(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_frame() {
        let frame = json!({"event": "PRIVMSG", "params": ["oftc", "alice", "#dazeus", "hi", 1]});
        let event = Event::from_frame(&frame).unwrap();
        assert!(event.is_privmsg());
        assert_eq!(event.params, vec!["oftc", "alice", "#dazeus", "hi", "1"]);

        assert!(Event::from_frame(&json!({"did": "message", "success": true})).is_none());
    }

    #[test]
    fn test_property_requests_carry_scope() {
        let req = request::get_property("karma_foo", &Scope::network("oftc"));
        assert_eq!(req["scope"], json!(["oftc"]));
        assert_eq!(req["params"], json!(["get", "karma_foo"]));

        let req = request::unset_property("karma_foo", &Scope::Global);
        assert_eq!(req["scope"], json!([]));
    }

    #[test]
    fn test_check_success() {
        assert!(check_success(json!({"success": true})).is_ok());
        let err = check_success(json!({"success": false, "error": "no such network"})).unwrap_err();
        assert!(err.to_string().contains("no such network"));
        assert!(check_success(json!({})).is_err());
    }

    #[test]
    fn test_property_value() {
        assert_eq!(property_value(&json!({"value": "3"})).as_deref(), Some("3"));
        assert_eq!(property_value(&json!({"value": 3})).as_deref(), Some("3"));
        assert_eq!(property_value(&json!({"value": null})), None);
        assert_eq!(property_value(&json!({})), None);
    }
}
