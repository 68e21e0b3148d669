//! Boundary to the incident-response platform
//!
//! Everything that talks to the remote platform goes through [`IncidentPlatform`],
//! so the assignment logic can be exercised without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{IncidentId, IncidentRecord};
use crate::policy::Token;
use crate::ActionResult;

pub mod rest;

pub use rest::RestPlatformClient;

/// Field name of the incident owner
pub const OWNER_FIELD: &str = "owner_id";
/// Field name of the incident member list
pub const MEMBERS_FIELD: &str = "members";

/// A change to a single field of an incident record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum IncidentMutation {
    SetOwner(Token),
    SetMembers(Vec<Token>),
}

impl IncidentMutation {
    /// Name of the field this mutation writes
    pub fn field(&self) -> &'static str {
        match self {
            IncidentMutation::SetOwner(_) => OWNER_FIELD,
            IncidentMutation::SetMembers(_) => MEMBERS_FIELD,
        }
    }

    /// Apply to a fetched record. Only the mutated field changes; every other
    /// field stays exactly as fetched.
    pub fn apply(&self, record: &mut IncidentRecord) {
        let value = match self {
            IncidentMutation::SetOwner(owner) => token_value(owner),
            IncidentMutation::SetMembers(members) => {
                Value::Array(members.iter().map(token_value).collect())
            }
        };
        record.insert(self.field().to_string(), value);
    }
}

fn token_value(token: &Token) -> Value {
    match token {
        Some(t) => Value::String(t.clone()),
        None => Value::Null,
    }
}

/// Remote collaborator for incident updates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncidentPlatform: Send + Sync {
    /// Fetch the incident, apply `mutation`, and write the merged record back.
    /// Returns the record as acknowledged by the platform.
    async fn fetch_and_mutate(&self, incident_id: &IncidentId, mutation: &IncidentMutation) -> ActionResult<Value>;

    /// Resolve a select-field code to its display label. `Ok(None)` means the
    /// field has no value with that code.
    async fn resolve_label(&self, field_name: &str, code: &Value) -> ActionResult<Option<String>>;
}
