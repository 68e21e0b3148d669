//! Shared harness for integration tests: an in-memory platform and a circuit
//! that fires events through the bus and waits for their completions.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use soar_actions::bus::{wait_for, ActionBus};
use soar_actions::config::{init_test_logging, Settings};
use soar_actions::models::{ActionEvent, CompletedEvent, FunctionEvent, IncidentId, IncidentRecord, IncidentSnapshot};
use soar_actions::platform::{IncidentMutation, IncidentPlatform};
use soar_actions::server::build_bus;
use soar_actions::{ActionError, ActionResult};

/// Severity codes as the platform's severity_code field defines them
pub const LOW: i64 = 4;
pub const MEDIUM: i64 = 5;
pub const HIGH: i64 = 6;
pub const UNLABELLED: i64 = 99;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// In-memory platform recording every mutation in call order
#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<(IncidentId, IncidentMutation)>>,
    records: Mutex<HashMap<IncidentId, IncidentRecord>>,
    labels: HashMap<String, String>,
    /// Incident ids whose updates the platform refuses
    refuse: Vec<IncidentId>,
}

impl RecordingPlatform {
    /// Severity codes 4/5/6 map to Low/Medium/High
    pub fn new() -> Self {
        let labels = [(HIGH, "High"), (MEDIUM, "Medium"), (LOW, "Low"), (7, "Critical")]
            .iter()
            .map(|(code, label)| (code.to_string(), label.to_string()))
            .collect();

        Self {
            labels,
            ..Default::default()
        }
    }

    pub fn refusing(mut self, incident_id: i64) -> Self {
        self.refuse.push(id(incident_id));
        self
    }

    pub fn with_record(self, incident_id: i64, record: Value) -> Self {
        if let Value::Object(map) = record {
            self.records.lock().unwrap().insert(id(incident_id), map);
        }
        self
    }

    pub fn calls(&self) -> Vec<(IncidentId, IncidentMutation)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn record(&self, incident_id: &IncidentId) -> Option<IncidentRecord> {
        self.records.lock().unwrap().get(incident_id).cloned()
    }
}

#[async_trait]
impl IncidentPlatform for RecordingPlatform {
    async fn fetch_and_mutate(&self, incident_id: &IncidentId, mutation: &IncidentMutation) -> ActionResult<Value> {
        self.calls.lock().unwrap().push((incident_id.clone(), mutation.clone()));

        if self.refuse.contains(incident_id) {
            return Err(ActionError::platform("update refused", Some(409)));
        }

        let mut records = self.records.lock().unwrap();
        let record = records.entry(incident_id.clone()).or_insert_with(|| {
            let mut fresh = Map::new();
            fresh.insert("id".to_string(), json!(incident_id));
            fresh
        });
        mutation.apply(record);
        Ok(Value::Object(record.clone()))
    }

    async fn resolve_label(&self, _field_name: &str, code: &Value) -> ActionResult<Option<String>> {
        let key = match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(self.labels.get(&key).cloned())
    }
}

/// Test circuit around a bus wired the way the service wires it
pub struct TestCircuit {
    pub bus: Arc<ActionBus>,
    pub platform: Arc<RecordingPlatform>,
    pub settings: Settings,
}

impl TestCircuit {
    pub fn new(settings: Settings, platform: RecordingPlatform) -> Self {
        let _ = init_test_logging();
        let platform = Arc::new(platform);
        let bus = Arc::new(build_bus(&settings, platform.clone()));
        Self { bus, platform, settings }
    }

    /// Fire `add_group` for the incident and wait for `add_group_result`
    pub async fn fire_add_group(&self, incident: IncidentSnapshot) -> ActionResult<CompletedEvent> {
        let mut watcher = self.bus.watch();
        let event = ActionEvent::new("add_group", incident);
        let id = event.id.clone();

        // Errors surface through the completion event as well
        let _ = self.bus.fire_action(&self.settings.addgroup.channel(), event).await;
        wait_for(&mut watcher, "add_group_result", &id, DEFAULT_TIMEOUT).await
    }

    /// Submit a function and wait for `<function>_result`
    pub async fn call_function(
        &self,
        function: &str,
        inputs: Value,
        timeout: Duration,
    ) -> ActionResult<CompletedEvent> {
        let inputs = match inputs {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut watcher = self.bus.watch();
        let event = FunctionEvent::new(function, inputs);
        let id = event.id.clone();

        let _ = self.bus.fire_function(event).await;
        wait_for(&mut watcher, &format!("{}_result", function), &id, timeout).await
    }
}

/// Numeric incident id, as the platform issues them
pub fn id(raw: i64) -> IncidentId {
    IncidentId::Number(raw)
}

/// Settings with every assignment key populated
pub fn full_settings() -> Settings {
    let mut settings = Settings::default();
    let addgroup = &mut settings.addgroup;
    addgroup.high_owner = Some("u1".to_string());
    addgroup.high_member_1 = Some("m1".to_string());
    addgroup.medium_owner = Some("u2".to_string());
    addgroup.medium_member_1 = Some("m2".to_string());
    addgroup.medium_member_2 = Some("m3".to_string());
    addgroup.low_owner = Some("u3".to_string());
    addgroup.low_member_1 = Some("m4".to_string());
    addgroup.low_member_2 = Some("m5".to_string());
    addgroup.low_member_3 = Some("m6".to_string());
    settings
}
