use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Opaque incident identifier.
///
/// The platform hands out numeric ids, but other sources may carry them as
/// text. Either form is accepted and written back in the form it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncidentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentId::Number(n) => write!(f, "{}", n),
            IncidentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IncidentId {
    fn from(id: i64) -> Self {
        IncidentId::Number(id)
    }
}

impl From<String> for IncidentId {
    fn from(id: String) -> Self {
        IncidentId::Text(id)
    }
}

impl From<&str> for IncidentId {
    fn from(id: &str) -> Self {
        IncidentId::Text(id.to_string())
    }
}

/// Command-line ids: digits become a numeric id, anything else stays text
impl FromStr for IncidentId {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Ok(match raw.parse::<i64>() {
            Ok(n) => IncidentId::Number(n),
            Err(_) => IncidentId::Text(raw.to_string()),
        })
    }
}

impl PartialEq<i64> for IncidentId {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, IncidentId::Number(n) if n == other)
    }
}

/// Incident as carried on an inbound action message.
///
/// Only `id` and `severity_code` are interpreted; everything else the
/// platform sends is kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSnapshot {
    pub id: IncidentId,
    /// Select-field id; resolves to a label through the platform
    #[serde(default)]
    pub severity_code: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IncidentSnapshot {
    pub fn new(id: i64, severity_code: impl Into<Value>) -> Self {
        Self::with_id(IncidentId::Number(id), severity_code)
    }

    pub fn with_id(id: impl Into<IncidentId>, severity_code: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            severity_code: Some(severity_code.into()),
            extra: Map::new(),
        }
    }

    /// The severity code, treating JSON null the same as an absent field
    pub fn severity(&self) -> Option<&Value> {
        self.severity_code.as_ref().filter(|v| !v.is_null())
    }
}

/// The full remote representation of an incident.
///
/// Kept as a raw JSON object so that a read-modify-write only touches the
/// field being mutated and writes every other field back as it was read.
pub type IncidentRecord = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_keeps_unknown_fields() {
        let snapshot: IncidentSnapshot = serde_json::from_value(json!({
            "id": 1001,
            "severity_code": 4,
            "name": "Phishing report",
            "discovered_date": 1500000000000i64
        }))
        .unwrap();

        assert_eq!(snapshot.id, 1001);
        assert_eq!(snapshot.severity(), Some(&json!(4)));
        assert_eq!(snapshot.extra.get("name"), Some(&json!("Phishing report")));
    }

    #[test]
    fn test_null_severity_is_absent() {
        let snapshot: IncidentSnapshot =
            serde_json::from_value(json!({"id": 7, "severity_code": null})).unwrap();
        assert!(snapshot.severity().is_none());

        let snapshot: IncidentSnapshot = serde_json::from_value(json!({"id": 7})).unwrap();
        assert!(snapshot.severity().is_none());
    }

    #[test]
    fn test_text_ids_are_accepted() {
        let snapshot: IncidentSnapshot =
            serde_json::from_value(json!({"id": "1001", "severity_code": 6})).unwrap();

        assert_eq!(snapshot.id, IncidentId::Text("1001".to_string()));
        assert_eq!(snapshot.id.to_string(), "1001");
        assert_eq!(serde_json::to_value(&snapshot.id).unwrap(), json!("1001"));
    }

    #[test]
    fn test_numeric_ids_keep_their_form() {
        let snapshot: IncidentSnapshot = serde_json::from_value(json!({"id": 42})).unwrap();
        assert_eq!(snapshot.id, IncidentId::Number(42));
        assert_eq!(serde_json::to_value(&snapshot.id).unwrap(), json!(42));
    }

    #[test]
    fn test_id_from_command_line() {
        assert_eq!("1001".parse::<IncidentId>().unwrap(), IncidentId::Number(1001));
        assert_eq!("INC-7".parse::<IncidentId>().unwrap(), IncidentId::from("INC-7"));
    }
}
