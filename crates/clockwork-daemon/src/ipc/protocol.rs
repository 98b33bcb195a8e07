use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;
use crate::events::DaemonEvent;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const APPLICATION_ERROR: i32 = -32000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    #[default]
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn application_error(message: impl Into<String>) -> Self {
        Self::new(APPLICATION_ERROR, message)
    }
}

impl From<ApiError> for JsonRpcError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::MethodNotFound(method) => Self::method_not_found(&method),
            ApiError::InvalidParams(message) => Self::invalid_params(message),
            other => Self::application_error(other.to_string()),
        }
    }
}

impl Request {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Parse one line off the wire. Failures come back as the error response
    /// to send, carrying whatever id could be recovered.
    pub fn parse(line: &str) -> std::result::Result<Self, Response> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| Response::error(JsonRpcError::parse_error(e.to_string()), RequestId::Null))?;

        let id: RequestId = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok())
            .unwrap_or_default();

        let request: Request = serde_json::from_value(value)
            .map_err(|e| Response::error(JsonRpcError::invalid_request(e.to_string()), id.clone()))?;

        request
            .validate()
            .map_err(|error| Response::error(error, id))?;
        Ok(request)
    }

    pub fn validate(&self) -> std::result::Result<(), JsonRpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::invalid_request("Invalid JSON-RPC version"));
        }
        Ok(())
    }
}

impl Response {
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// Wrap a daemon event under its `<category>.event` method
    pub fn from_event(event: &DaemonEvent) -> serde_json::Result<Self> {
        let params = match event {
            DaemonEvent::Clock(e) => serde_json::to_value(e)?,
            DaemonEvent::Alarm(e) => serde_json::to_value(e)?,
            DaemonEvent::Countdown(e) => serde_json::to_value(e)?,
            DaemonEvent::Stopwatch(e) => serde_json::to_value(e)?,
            DaemonEvent::Settings(e) => serde_json::to_value(e)?,
        };
        Ok(Self::new(event.method(), params))
    }
}
