// Public exports for data models

pub mod events;
pub mod incident;
pub mod severity;

pub use events::{ActionEvent, ActionMessage, ActionStatus, CompletedEvent, FunctionEvent, FunctionResult};
pub use incident::{IncidentId, IncidentRecord, IncidentSnapshot};
pub use severity::SeverityLabel;

/// Name of the incident select field carrying the severity code
pub const SEVERITY_FIELD: &str = "severity_code";
