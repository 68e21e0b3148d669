use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::incident::IncidentSnapshot;

fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An action fired on an `actions.<queue>` channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    #[serde(default = "new_event_id")]
    pub id: String,
    /// Handler name, e.g. `add_group`
    pub action: String,
    pub message: ActionMessage,
}

impl ActionEvent {
    pub fn new(action: impl Into<String>, incident: IncidentSnapshot) -> Self {
        Self {
            id: new_event_id(),
            action: action.into(),
            message: ActionMessage {
                incident,
                extra: Map::new(),
            },
        }
    }
}

/// Payload of an action event. Besides the incident the platform may attach
/// the triggering object, user and so on; those ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMessage {
    pub incident: IncidentSnapshot,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply to an action event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStatus {
    pub event_id: String,
    pub action: String,
    pub status: String,
    pub completed_at: DateTime<Utc>,
}

/// A function invocation submitted to the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEvent {
    #[serde(default = "new_event_id")]
    pub id: String,
    pub function: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

impl FunctionEvent {
    pub fn new(function: impl Into<String>, inputs: Map<String, Value>) -> Self {
        Self {
            id: new_event_id(),
            function: function.into(),
            inputs,
        }
    }
}

/// Value produced by a function component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub value: Value,
}

impl FunctionResult {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// Published on the bus once an action or function finishes, named
/// `<action|function>_result` and linked to the event that caused it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedEvent {
    pub name: String,
    pub parent: String,
    pub success: bool,
    pub result: Value,
    pub completed_at: DateTime<Utc>,
}

impl CompletedEvent {
    pub fn result_name(source: &str) -> String {
        format!("{}_result", source)
    }
}
