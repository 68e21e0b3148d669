//! Severity-driven assignment policy
//!
//! Maps an incident's severity tier onto the owner and member list it should
//! carry. The functions here are pure; applying the result to the remote
//! incident is the job of [`crate::handlers::add_group`].

use serde::{Deserialize, Serialize};

use crate::config::AddGroupConfig;
use crate::models::SeverityLabel;

/// An owner or member identifier. `None` stands for a key missing from the
/// configuration and is written to the platform as JSON null.
pub type Token = Option<String>;

/// Outcome of the policy for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment<T> {
    /// Severity outside the recognised tiers; the field must not be touched
    Unchanged,
    Set(T),
}

impl<T> Assignment<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Assignment::Unchanged)
    }
}

/// Owner and member tokens per severity tier, fixed for the process lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentConfig {
    pub high_owner: Token,
    pub medium_owner: Token,
    pub low_owner: Token,
    pub high_member_1: Token,
    pub medium_member_1: Token,
    pub medium_member_2: Token,
    pub low_member_1: Token,
    pub low_member_2: Token,
    pub low_member_3: Token,
}

impl From<&AddGroupConfig> for AssignmentConfig {
    fn from(section: &AddGroupConfig) -> Self {
        Self {
            high_owner: section.high_owner.clone(),
            medium_owner: section.medium_owner.clone(),
            low_owner: section.low_owner.clone(),
            high_member_1: section.high_member_1.clone(),
            medium_member_1: section.medium_member_1.clone(),
            medium_member_2: section.medium_member_2.clone(),
            low_member_1: section.low_member_1.clone(),
            low_member_2: section.low_member_2.clone(),
            low_member_3: section.low_member_3.clone(),
        }
    }
}

/// New owner for an incident of the given severity
pub fn compute_owner(severity: SeverityLabel, config: &AssignmentConfig) -> Assignment<Token> {
    match severity {
        SeverityLabel::High => Assignment::Set(config.high_owner.clone()),
        SeverityLabel::Medium => Assignment::Set(config.medium_owner.clone()),
        SeverityLabel::Low => Assignment::Set(config.low_owner.clone()),
        SeverityLabel::Other => Assignment::Unchanged,
    }
}

/// New member list for an incident of the given severity, in configured order
pub fn compute_members(severity: SeverityLabel, config: &AssignmentConfig) -> Assignment<Vec<Token>> {
    match severity {
        SeverityLabel::High => Assignment::Set(vec![config.high_member_1.clone()]),
        SeverityLabel::Medium => Assignment::Set(vec![
            config.medium_member_1.clone(),
            config.medium_member_2.clone(),
        ]),
        SeverityLabel::Low => Assignment::Set(vec![
            config.low_member_1.clone(),
            config.low_member_2.clone(),
            config.low_member_3.clone(),
        ]),
        SeverityLabel::Other => Assignment::Unchanged,
    }
}
