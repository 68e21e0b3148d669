//! Function components and their customization definitions
//!
//! A function is invoked with named inputs and answers with a single
//! [`FunctionResult`]. Each component also publishes the definition the
//! platform needs to expose it to playbooks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::FunctionResult;
use crate::{ActionError, ActionResult};

pub mod set_event_mitigations;

pub use set_event_mitigations::SetEventMitigations;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    pub name: String,
    pub input_type: InputType,
    pub required: bool,
}

impl FunctionInput {
    pub fn required_text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input_type: InputType::Text,
            required: true,
        }
    }
}

/// Customization data describing a function to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub package: String,
    pub name: String,
    pub display_name: String,
    pub inputs: Vec<FunctionInput>,
}

impl FunctionDefinition {
    /// Check that every required input is present and of the declared type
    pub fn check_inputs(&self, inputs: &Map<String, Value>) -> ActionResult<()> {
        for input in &self.inputs {
            match inputs.get(&input.name) {
                None | Some(Value::Null) if input.required => {
                    return Err(ActionError::invalid_event(format!(
                        "{}: missing required input '{}'",
                        self.name, input.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    let matches = match input.input_type {
                        InputType::Text => value.is_string(),
                        InputType::Number => value.is_number(),
                        InputType::Boolean => value.is_boolean(),
                    };
                    if !matches {
                        return Err(ActionError::invalid_event(format!(
                            "{}: input '{}' should be {:?}, got {}",
                            self.name, input.name, input.input_type, value
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A function hosted on the bus
#[async_trait]
pub trait FunctionComponent: Send + Sync {
    fn name(&self) -> &'static str;

    fn definition(&self) -> FunctionDefinition;

    async fn call(&self, inputs: &Map<String, Value>) -> ActionResult<FunctionResult>;
}

/// Definitions of every function this crate ships
pub fn customization_definitions() -> Vec<FunctionDefinition> {
    vec![SetEventMitigations.definition()]
}

/// Look up a shipped function definition by package and function name
pub fn get_function_definition(package: &str, name: &str) -> Option<FunctionDefinition> {
    customization_definitions()
        .into_iter()
        .find(|def| def.package == package && def.name == name)
}
