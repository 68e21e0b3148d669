use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of an incident, resolved from its severity select field.
///
/// Labels outside the three recognised tiers collapse into `Other`, which the
/// assignment policy treats as "leave the incident alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityLabel {
    High,
    Medium,
    Low,
    Other,
}

impl SeverityLabel {
    /// Map a platform label onto a tier. Matching is exact, as the platform
    /// reports labels verbatim.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("High") => SeverityLabel::High,
            Some("Medium") => SeverityLabel::Medium,
            Some("Low") => SeverityLabel::Low,
            _ => SeverityLabel::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::High => "High",
            SeverityLabel::Medium => "Medium",
            SeverityLabel::Low => "Low",
            SeverityLabel::Other => "Other",
        }
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
