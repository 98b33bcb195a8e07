//! JSON-RPC wire types as seen from the client

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Pushed by the daemon, never answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// Error returned by the daemon for a request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

impl Response {
    /// The result value, or the daemon's error
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(error) => Err(RpcError {
                code: error.code,
                message: error.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A line from the daemon: either a response or a notification
#[derive(Debug, Clone)]
pub enum Incoming {
    Response(Response),
    Notification(Notification),
}

impl Incoming {
    pub fn parse(line: &str) -> Option<Self> {
        if let Ok(response) = serde_json::from_str::<Response>(line)
            && (response.result.is_some() || response.error.is_some())
        {
            return Some(Incoming::Response(response));
        }
        serde_json::from_str::<Notification>(line)
            .ok()
            .map(Incoming::Notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response() {
        let line = r#"{"jsonrpc":"2.0","result":{"zones":[]},"id":4}"#;
        match Incoming::parse(line) {
            Some(Incoming::Response(response)) => {
                assert_eq!(response.id, RequestId::Number(4));
                assert_eq!(response.into_result().unwrap(), json!({ "zones": [] }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_response() {
        let line = r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found: x"},"id":2}"#;
        let Some(Incoming::Response(response)) = Incoming::parse(line) else {
            panic!("expected a response");
        };

        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, -32601);
        assert_eq!(error.to_string(), "RPC error -32601: Method not found: x");
    }

    #[test]
    fn test_parse_notification() {
        let line = r#"{"jsonrpc":"2.0","method":"countdown.event","params":{"event_type":{"type":"completed"}}}"#;
        match Incoming::parse(line) {
            Some(Incoming::Notification(notification)) => {
                assert_eq!(notification.method, "countdown.event");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Incoming::parse("hello").is_none());
    }
}
