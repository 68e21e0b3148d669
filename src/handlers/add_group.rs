//! The `add_group` action: reassign an incident's owner and members by severity

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::ActionHandler;
use crate::log_event;
use crate::models::{ActionMessage, IncidentId, IncidentSnapshot, SeverityLabel, SEVERITY_FIELD};
use crate::platform::{IncidentMutation, IncidentPlatform};
use crate::policy::{compute_members, compute_owner, Assignment, AssignmentConfig};
use crate::ActionResult;

pub const ADD_GROUP_ACTION: &str = "add_group";

pub fn status_message(incident_id: &IncidentId) -> String {
    format!("Finished adding users to incident {} due to severity change", incident_id)
}

/// Applies the severity assignment policy to the incident named in an
/// `add_group` event: owner first, then members, each as its own
/// read-modify-write on the platform.
pub struct AddGroupHandler {
    platform: Arc<dyn IncidentPlatform>,
    config: Arc<AssignmentConfig>,
}

impl AddGroupHandler {
    pub fn new(platform: Arc<dyn IncidentPlatform>, config: Arc<AssignmentConfig>) -> Self {
        Self { platform, config }
    }

    /// Resolve the incident's severity code to a tier. An absent code, or one
    /// the platform has no label for, yields `Other`.
    pub async fn resolve_severity(&self, incident: &IncidentSnapshot) -> ActionResult<SeverityLabel> {
        let code = match incident.severity() {
            Some(code) => code,
            None => return Ok(SeverityLabel::Other),
        };

        let label = self.platform.resolve_label(SEVERITY_FIELD, code).await?;
        log_event!(incident = incident.id, info, label = ?label, "Resolved severity label");
        Ok(SeverityLabel::from_label(label.as_deref()))
    }

    /// Write the policy outcome to the platform. Owner always goes before
    /// members; a failure in either ends the cycle.
    pub async fn apply_assignments(&self, incident_id: &IncidentId, severity: SeverityLabel) -> ActionResult<()> {
        if let Assignment::Set(owner) = compute_owner(severity, &self.config) {
            self.update(incident_id, IncidentMutation::SetOwner(owner)).await?;
        }

        if let Assignment::Set(members) = compute_members(severity, &self.config) {
            self.update(incident_id, IncidentMutation::SetMembers(members)).await?;
        }

        Ok(())
    }

    async fn update(&self, incident_id: &IncidentId, mutation: IncidentMutation) -> ActionResult<()> {
        match self.platform.fetch_and_mutate(incident_id, &mutation).await {
            Ok(_) => {
                log_event!(incident = incident_id, debug, field = mutation.field(), "Incident updated");
                Ok(())
            }
            Err(e) => {
                error!(incident_id = %incident_id, field = mutation.field(), "Incident update failed: {}", e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ActionHandler for AddGroupHandler {
    fn action_name(&self) -> &'static str {
        ADD_GROUP_ACTION
    }

    async fn handle(&self, message: &ActionMessage) -> ActionResult<String> {
        let incident = &message.incident;
        let severity = self.resolve_severity(incident).await?;

        if severity == SeverityLabel::Other {
            info!(incident_id = %incident.id, "Severity not in High/Medium/Low, leaving owner and members as they are");
        }

        self.apply_assignments(&incident.id, severity).await?;
        Ok(status_message(&incident.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockIncidentPlatform;
    use crate::ActionError;
    use mockall::Sequence;
    use serde_json::{json, Map};

    fn token(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn config() -> Arc<AssignmentConfig> {
        Arc::new(AssignmentConfig {
            high_owner: token("u1"),
            medium_owner: token("u2"),
            low_owner: token("u3"),
            high_member_1: token("m1"),
            medium_member_1: token("m2"),
            medium_member_2: token("m3"),
            low_member_1: token("m4"),
            low_member_2: token("m5"),
            low_member_3: token("m6"),
        })
    }

    fn message(id: i64, code: i64) -> ActionMessage {
        ActionMessage {
            incident: IncidentSnapshot::new(id, code),
            extra: Map::new(),
        }
    }

    fn expect_label(mock: &mut MockIncidentPlatform, code: i64, label: Option<&'static str>) {
        mock.expect_resolve_label()
            .withf(move |field, c| field == SEVERITY_FIELD && c == &json!(code))
            .times(1)
            .returning(move |_, _| Ok(label.map(str::to_string)));
    }

    #[tokio::test]
    async fn test_high_severity_sets_owner_then_members() {
        let mut mock = MockIncidentPlatform::new();
        let mut seq = Sequence::new();
        expect_label(&mut mock, 6, Some("High"));

        mock.expect_fetch_and_mutate()
            .withf(|id, m| *id == 1001 && m == &IncidentMutation::SetOwner(Some("u1".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({})));
        mock.expect_fetch_and_mutate()
            .withf(|id, m| *id == 1001 && m == &IncidentMutation::SetMembers(vec![Some("m1".to_string())]))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({})));

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        let status = handler.handle(&message(1001, 6)).await.unwrap();

        assert_eq!(status, "Finished adding users to incident 1001 due to severity change");
    }

    #[tokio::test]
    async fn test_low_severity_writes_three_members() {
        let mut mock = MockIncidentPlatform::new();
        let mut seq = Sequence::new();
        expect_label(&mut mock, 4, Some("Low"));

        mock.expect_fetch_and_mutate()
            .withf(|_, m| m == &IncidentMutation::SetOwner(Some("u3".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({})));
        mock.expect_fetch_and_mutate()
            .withf(|_, m| {
                m == &IncidentMutation::SetMembers(vec![
                    Some("m4".to_string()),
                    Some("m5".to_string()),
                    Some("m6".to_string()),
                ])
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({})));

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        assert!(handler.handle(&message(42, 4)).await.is_ok());
    }

    #[tokio::test]
    async fn test_text_incident_id_is_passed_through() {
        let mut mock = MockIncidentPlatform::new();
        expect_label(&mut mock, 6, Some("High"));
        mock.expect_fetch_and_mutate()
            .withf(|id, _| id == &IncidentId::Text("INC-1001".to_string()))
            .times(2)
            .returning(|_, _| Ok(json!({})));

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        let msg = ActionMessage {
            incident: IncidentSnapshot::with_id("INC-1001", 6),
            extra: Map::new(),
        };

        let status = handler.handle(&msg).await.unwrap();
        assert_eq!(status, "Finished adding users to incident INC-1001 due to severity change");
    }

    #[tokio::test]
    async fn test_unrecognized_label_does_not_touch_incident() {
        let mut mock = MockIncidentPlatform::new();
        expect_label(&mut mock, 99, Some("Critical"));
        mock.expect_fetch_and_mutate().never();

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        let status = handler.handle(&message(7, 99)).await.unwrap();

        assert_eq!(status, status_message(&IncidentId::from(7)));
    }

    #[tokio::test]
    async fn test_missing_severity_skips_label_lookup() {
        let mut mock = MockIncidentPlatform::new();
        mock.expect_resolve_label().never();
        mock.expect_fetch_and_mutate().never();

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        let msg = ActionMessage {
            incident: serde_json::from_value(json!({"id": 8, "severity_code": null})).unwrap(),
            extra: Map::new(),
        };

        assert!(handler.handle(&msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_owner_failure_stops_before_members() {
        let mut mock = MockIncidentPlatform::new();
        expect_label(&mut mock, 5, Some("Medium"));

        mock.expect_fetch_and_mutate()
            .withf(|_, m| matches!(m, IncidentMutation::SetOwner(_)))
            .times(1)
            .returning(|_, _| Err(ActionError::platform("forbidden", Some(403))));
        mock.expect_fetch_and_mutate()
            .withf(|_, m| matches!(m, IncidentMutation::SetMembers(_)))
            .never();

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        let result = handler.handle(&message(1001, 5)).await;

        assert!(matches!(result, Err(ActionError::Platform { status: Some(403), .. })));
    }

    #[tokio::test]
    async fn test_label_lookup_failure_is_fatal() {
        let mut mock = MockIncidentPlatform::new();
        mock.expect_resolve_label()
            .returning(|_, _| Err(ActionError::platform("unavailable", Some(503))));
        mock.expect_fetch_and_mutate().never();

        let handler = AddGroupHandler::new(Arc::new(mock), config());
        assert!(handler.handle(&message(1001, 6)).await.is_err());
    }
}
