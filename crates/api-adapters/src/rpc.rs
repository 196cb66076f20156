//! JSON-RPC 2.0 envelope types and the domain error → RPC code mapping.

use domains::DomainError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC 2.0 protocol version.
pub const JSON_RPC_VERSION: &str = "2.0";

/// Incoming request. `method` is a String since it comes from external input.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(Value::from(id)),
        }
    }

    /// Validates that this is a valid JSON-RPC 2.0 request.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.jsonrpc != JSON_RPC_VERSION {
            return Err("Invalid JSON-RPC version");
        }
        if self.method.is_empty() {
            return Err("Method name required");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object.
///
/// Standard codes plus application codes in the -32000 to -32099 range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub const NOT_FOUND: i32 = -32001;
    pub const VALIDATION_FAILED: i32 = -32002;
    pub const UNAUTHORIZED: i32 = -32005;
    pub const FORBIDDEN: i32 = -32006;
    pub const LOCKED: i32 = -32007;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, msg)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method '{method}' not found"))
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, msg)
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::with_data(Self::UNAUTHORIZED, msg, json!({ "kind": "Unauthorized" }))
    }

    /// Failure kind carried in `data.kind`, if any.
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<DomainError> for RpcError {
    fn from(err: DomainError) -> Self {
        let kind = err.kind();
        match err {
            DomainError::Validation(errors) => Self::with_data(
                Self::VALIDATION_FAILED,
                "Validation failed",
                json!({ "kind": kind, "errors": errors }),
            ),
            DomainError::Storage(_) => {
                Self::with_data(Self::INTERNAL_ERROR, "internal error", json!({ "kind": kind }))
            }
            other => {
                let code = match other {
                    DomainError::Unauthorized(_) => Self::UNAUTHORIZED,
                    DomainError::Forbidden(_) => Self::FORBIDDEN,
                    DomainError::Locked(_) => Self::LOCKED,
                    _ => Self::NOT_FOUND,
                };
                Self::with_data(code, other.to_string(), json!({ "kind": kind }))
            }
        }
    }
}

/// Parses JSON-RPC parameters into a typed struct.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}

/// Converts a serializable value to JSON, mapping errors to RPC errors.
pub fn to_json<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(e.to_string()))
}
