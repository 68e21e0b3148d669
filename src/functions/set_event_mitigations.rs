use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{FunctionComponent, FunctionDefinition, FunctionInput};
use crate::models::FunctionResult;
use crate::ActionResult;

pub const RISK_FABRIC_PACKAGE: &str = "fn_risk_fabric";
pub const SET_EVENT_MITIGATIONS: &str = "set_event_mitigations";

/// Fixed value the simulated function answers with
pub const SIMULATED_MITIGATION_VALUE: &str = "xyz";

const INPUTS: [&str; 4] = [
    "riskmodelinstanceid",
    "cardinstanceid",
    "focusentityid",
    "actionplanguid",
];

/// Simulated risk-fabric function. It validates its inputs and returns the
/// fixture result without calling out anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetEventMitigations;

#[async_trait]
impl FunctionComponent for SetEventMitigations {
    fn name(&self) -> &'static str {
        SET_EVENT_MITIGATIONS
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition {
            package: RISK_FABRIC_PACKAGE.to_string(),
            name: SET_EVENT_MITIGATIONS.to_string(),
            display_name: "Risk Fabric: Set Event Mitigations".to_string(),
            inputs: INPUTS.iter().map(|name| FunctionInput::required_text(name)).collect(),
        }
    }

    async fn call(&self, inputs: &Map<String, Value>) -> ActionResult<FunctionResult> {
        self.definition().check_inputs(inputs)?;

        info!(
            risk_model_instance = ?inputs.get("riskmodelinstanceid"),
            card_instance = ?inputs.get("cardinstanceid"),
            "Setting event mitigations"
        );

        Ok(FunctionResult::new(json!({ "value": SIMULATED_MITIGATION_VALUE })))
    }
}
