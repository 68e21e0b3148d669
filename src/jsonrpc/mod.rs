//! JSON-RPC 2.0 front end for the action bus
//!
//! Every action channel registered on the [`ActionBus`] is exposed as a method
//! of the same name (`actions.addgroup` and so on) taking an [`ActionEvent`].
//! Function events go through [`SUBMIT_FUNCTION`]. Messages are framed with
//! LSP-style Content-Length headers over stdio or a Unix socket.

pub mod methods;
pub mod protocol;
pub mod server;
pub mod transport;

pub use methods::{is_action_channel, ACTION_CHANNEL_PREFIX, LIST_FUNCTIONS, SUBMIT_FUNCTION};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::{JsonRpcServer, MethodHandler, MethodRegistry};
pub use transport::{MalformedRequest, StdioTransport, Transport, TransportConfig};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bus::ActionBus;
use crate::functions::customization_definitions;
use crate::models::{ActionEvent, FunctionEvent};

pub const JSONRPC_VERSION: &str = "2.0";

/// Register one method per bus channel plus the function methods
///
/// Action methods accept a raw action event:
/// ```json
/// {
///   "action": "add_group",
///   "message": { "incident": { "id": 1001, "severity_code": 4 } }
/// }
/// ```
pub async fn register_action_methods(registry: &MethodRegistry, bus: Arc<ActionBus>) {
    for channel in bus.channels() {
        if !is_action_channel(&channel) {
            warn!("Channel '{}' lacks the '{}' prefix", channel, ACTION_CHANNEL_PREFIX);
        }

        let bus = bus.clone();
        let channel_name = channel.clone();
        registry
            .register_method(channel, move |params| {
                let bus = bus.clone();
                let channel = channel_name.clone();
                async move {
                    let event: ActionEvent = parse_params(params)?;
                    let status = bus.fire_action(&channel, event).await?;
                    to_result(&status)
                }
            })
            .await;
    }

    {
        let bus = bus.clone();
        registry
            .register_method(SUBMIT_FUNCTION, move |params| {
                let bus = bus.clone();
                async move {
                    let event: FunctionEvent = parse_params(params)?;
                    let result = bus.fire_function(event).await?;
                    to_result(&result)
                }
            })
            .await;
    }

    registry
        .register_method(LIST_FUNCTIONS, |_| async move { to_result(&customization_definitions()) })
        .await;

    info!(
        "Registered {} JSON-RPC methods",
        registry.method_names().await.len()
    );
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.unwrap_or(Value::Null);
    serde_json::from_value(params.clone()).map_err(|e| create_parse_error::<T>(&e, &params))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        JsonRpcError::custom(
            protocol::error_codes::INTERNAL_ERROR,
            format!("Failed to serialize response: {}", e),
            None,
        )
    })
}

fn create_parse_error<T>(error: &serde_json::Error, params: &Value) -> JsonRpcError {
    let type_name = std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("Request");

    let received_fields: Vec<&str> = match params {
        Value::Object(map) => map.keys().map(|s| s.as_str()).collect(),
        _ => vec![],
    };

    let hint = if received_fields.is_empty() {
        "No parameters provided".to_string()
    } else {
        format!("Received fields: {}", received_fields.join(", "))
    };

    JsonRpcError::custom(
        protocol::error_codes::INVALID_PARAMS,
        format!("Invalid {}: {}. {}", type_name, error, hint),
        Some(serde_json::json!({
            "parse_error": error.to_string(),
            "received": params,
        })),
    )
}
