//! JSON-RPC 2.0 message types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JSONRPC_VERSION;

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent for notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate the request structure
    pub fn validate(&self) -> Result<(), JsonRpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::custom(
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
                None,
            ));
        }

        if self.method.is_empty() {
            return Err(JsonRpcError::custom(
                error_codes::INVALID_REQUEST,
                "Method name cannot be empty".to_string(),
                None,
            ));
        }

        if self.method.starts_with("rpc.") {
            return Err(JsonRpcError::custom(
                error_codes::INVALID_REQUEST,
                "Method names starting with 'rpc.' are reserved".to_string(),
                None,
            ));
        }

        Ok(())
    }
}

impl JsonRpcResponse {
    pub fn success(result: Value, id: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn parse_error() -> Self {
        Self::error(
            JsonRpcError::custom(error_codes::PARSE_ERROR, "Parse error".to_string(), None),
            None,
        )
    }

    pub fn method_not_found(method: &str, id: Option<Value>) -> Self {
        Self::error(
            JsonRpcError::custom(
                error_codes::METHOD_NOT_FOUND,
                "Method not found".to_string(),
                Some(serde_json::json!({ "method": method })),
            ),
            id,
        )
    }
}

impl JsonRpcError {
    /// Create a custom application error
    pub fn custom(code: i32, message: String, data: Option<Value>) -> Self {
        Self { code, message, data }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

impl From<crate::ActionError> for JsonRpcError {
    fn from(error: crate::ActionError) -> Self {
        let data = match &error {
            crate::ActionError::Platform { status: Some(status), .. } => {
                Some(serde_json::json!({ "http_status": status }))
            }
            _ => None,
        };

        JsonRpcError {
            code: error.error_code(),
            message: error.user_message(),
            data,
        }
    }
}
