mod common;

use serde_json::json;
use soar_actions::config::Settings;
use soar_actions::models::{IncidentId, IncidentSnapshot};
use soar_actions::platform::{IncidentMutation, IncidentPlatform};

use common::{full_settings, id, RecordingPlatform, TestCircuit, HIGH, LOW, MEDIUM, UNLABELLED};

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

#[tokio::test]
async fn test_high_severity_end_to_end() {
    let mut settings = Settings::default();
    settings.addgroup.high_owner = some("u1");
    settings.addgroup.high_member_1 = some("m1");
    let circuit = TestCircuit::new(settings, RecordingPlatform::new());

    let completed = circuit
        .fire_add_group(IncidentSnapshot::new(1001, HIGH))
        .await
        .unwrap();

    assert!(completed.success);
    assert_eq!(
        completed.result,
        json!("Finished adding users to incident 1001 due to severity change")
    );
    assert_eq!(
        circuit.platform.calls(),
        vec![
            (id(1001), IncidentMutation::SetOwner(some("u1"))),
            (id(1001), IncidentMutation::SetMembers(vec![some("m1")])),
        ]
    );
}

#[tokio::test]
async fn test_medium_and_low_member_lists() {
    let circuit = TestCircuit::new(full_settings(), RecordingPlatform::new());

    circuit.fire_add_group(IncidentSnapshot::new(1, MEDIUM)).await.unwrap();
    circuit.fire_add_group(IncidentSnapshot::new(2, LOW)).await.unwrap();

    assert_eq!(
        circuit.platform.calls(),
        vec![
            (id(1), IncidentMutation::SetOwner(some("u2"))),
            (id(1), IncidentMutation::SetMembers(vec![some("m2"), some("m3")])),
            (id(2), IncidentMutation::SetOwner(some("u3"))),
            (id(2), IncidentMutation::SetMembers(vec![some("m4"), some("m5"), some("m6")])),
        ]
    );
}

#[tokio::test]
async fn test_unrecognized_severity_leaves_incident_alone() {
    let circuit = TestCircuit::new(full_settings(), RecordingPlatform::new());

    // "Critical" is a real label but not one the policy knows
    for code in [json!(7), json!(UNLABELLED), json!(null)] {
        let mut incident = IncidentSnapshot::new(1002, 0);
        incident.severity_code = Some(code);

        let completed = circuit.fire_add_group(incident).await.unwrap();
        assert!(completed.success);
        assert_eq!(
            completed.result,
            json!("Finished adding users to incident 1002 due to severity change")
        );
    }

    assert!(circuit.platform.calls().is_empty());
}

#[tokio::test]
async fn test_missing_keys_write_nulls() {
    let circuit = TestCircuit::new(Settings::default(), RecordingPlatform::new());

    circuit.fire_add_group(IncidentSnapshot::new(1003, MEDIUM)).await.unwrap();

    let record = circuit.platform.record(&id(1003)).unwrap();
    assert_eq!(record["owner_id"], json!(null));
    assert_eq!(record["members"], json!([null, null]));
}

#[tokio::test]
async fn test_untouched_fields_survive_updates() {
    let platform = RecordingPlatform::new().with_record(
        1004,
        json!({"id": 1004, "name": "Phishing", "owner_id": "old", "members": ["x"], "plan_status": "A"}),
    );
    let circuit = TestCircuit::new(full_settings(), platform);

    circuit.fire_add_group(IncidentSnapshot::new(1004, HIGH)).await.unwrap();

    let record = circuit.platform.record(&id(1004)).unwrap();
    assert_eq!(record["owner_id"], "u1");
    assert_eq!(record["members"], json!(["m1"]));
    assert_eq!(record["name"], "Phishing");
    assert_eq!(record["plan_status"], "A");
}

#[tokio::test]
async fn test_owner_failure_stops_cycle() {
    let circuit = TestCircuit::new(full_settings(), RecordingPlatform::new().refusing(1005));

    let completed = circuit
        .fire_add_group(IncidentSnapshot::new(1005, HIGH))
        .await
        .unwrap();

    assert!(!completed.success);
    assert_eq!(
        circuit.platform.calls(),
        vec![(id(1005), IncidentMutation::SetOwner(some("u1")))]
    );
}

#[tokio::test]
async fn test_custom_queue_channel() {
    let mut settings = full_settings();
    settings.addgroup.queue = "severity_watch".to_string();
    let circuit = TestCircuit::new(settings, RecordingPlatform::new());

    assert_eq!(circuit.bus.channels(), vec!["actions.severity_watch".to_string()]);
    let completed = circuit.fire_add_group(IncidentSnapshot::new(1006, LOW)).await.unwrap();
    assert!(completed.success);
}

#[tokio::test]
async fn test_text_incident_id_end_to_end() {
    let circuit = TestCircuit::new(full_settings(), RecordingPlatform::new());

    let completed = circuit
        .fire_add_group(IncidentSnapshot::with_id("1001", HIGH))
        .await
        .unwrap();

    assert!(completed.success);
    assert_eq!(
        completed.result,
        json!("Finished adding users to incident 1001 due to severity change")
    );

    let text_id = IncidentId::from("1001");
    assert_eq!(
        circuit.platform.calls(),
        vec![
            (text_id.clone(), IncidentMutation::SetOwner(some("u1"))),
            (text_id.clone(), IncidentMutation::SetMembers(vec![some("m1")])),
        ]
    );
    assert_eq!(circuit.platform.record(&text_id).unwrap()["id"], json!("1001"));
}

#[tokio::test]
async fn test_harness_uses_platform_severity_codes() {
    let platform = RecordingPlatform::new();

    for (code, label) in [(4, "Low"), (5, "Medium"), (6, "High")] {
        let resolved = platform.resolve_label("severity_code", &json!(code)).await.unwrap();
        assert_eq!(resolved.as_deref(), Some(label));
    }
}
