//! In-process event bus
//!
//! Routes action events by channel and action name, and function events by
//! function name. Every finished event is announced as a [`CompletedEvent`] on a
//! broadcast channel so callers (the JSON-RPC layer, test harnesses) can wait
//! for the result of a specific event.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::functions::FunctionComponent;
use crate::handlers::ActionHandler;
use crate::log_event;
use crate::models::{ActionEvent, ActionStatus, CompletedEvent, FunctionEvent, FunctionResult};
use crate::{ActionError, ActionResult};

const COMPLETION_BUFFER: usize = 256;

pub struct ActionBus {
    /// channel -> action name -> handler
    actions: HashMap<String, HashMap<&'static str, Arc<dyn ActionHandler>>>,
    functions: HashMap<&'static str, Arc<dyn FunctionComponent>>,
    completed: broadcast::Sender<CompletedEvent>,
}

impl ActionBus {
    pub fn new() -> Self {
        let (completed, _) = broadcast::channel(COMPLETION_BUFFER);
        Self {
            actions: HashMap::new(),
            functions: HashMap::new(),
            completed,
        }
    }

    /// Subscribe `handler` to its action on `channel`
    pub fn register_action(&mut self, channel: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let channel = channel.into();
        info!("Registered action '{}' on channel '{}'", handler.action_name(), channel);
        self.actions
            .entry(channel)
            .or_default()
            .insert(handler.action_name(), handler);
    }

    pub fn register_function(&mut self, component: Arc<dyn FunctionComponent>) {
        info!("Registered function '{}'", component.name());
        self.functions.insert(component.name(), component);
    }

    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.actions.keys().cloned().collect();
        channels.sort();
        channels
    }

    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.keys().copied().collect();
        names.sort();
        names
    }

    /// Receive every completion published after this call
    pub fn watch(&self) -> broadcast::Receiver<CompletedEvent> {
        self.completed.subscribe()
    }

    /// Deliver an action event arriving on `channel` to its handler
    pub async fn fire_action(&self, channel: &str, event: ActionEvent) -> ActionResult<ActionStatus> {
        let handler = self
            .actions
            .get(channel)
            .and_then(|handlers| handlers.get(event.action.as_str()))
            .cloned()
            .ok_or_else(|| ActionError::UnknownAction(format!("{} on {}", event.action, channel)))?;

        log_event!(event = event.id, info, channel, action = %event.action, "Dispatching action");

        let outcome = handler.handle(&event.message).await;
        let result_name = CompletedEvent::result_name(&event.action);

        match outcome {
            Ok(status) => {
                self.publish(result_name, &event.id, true, Value::String(status.clone()));
                Ok(ActionStatus {
                    event_id: event.id,
                    action: event.action,
                    status,
                    completed_at: Utc::now(),
                })
            }
            Err(e) => {
                error!("Action '{}' failed for event {}: {}", event.action, event.id, e);
                self.publish(result_name, &event.id, false, Value::String(e.user_message()));
                Err(e)
            }
        }
    }

    /// Run a function event and return the function's result
    pub async fn fire_function(&self, event: FunctionEvent) -> ActionResult<FunctionResult> {
        let component = self
            .functions
            .get(event.function.as_str())
            .cloned()
            .ok_or_else(|| ActionError::UnknownFunction(event.function.clone()))?;

        log_event!(event = event.id, info, function = %event.function, "Calling function");

        let outcome = component.call(&event.inputs).await;
        let result_name = CompletedEvent::result_name(&event.function);

        match &outcome {
            Ok(result) => self.publish(result_name, &event.id, true, result.value.clone()),
            Err(e) => {
                error!("Function '{}' failed for event {}: {}", event.function, event.id, e);
                self.publish(result_name, &event.id, false, Value::String(e.user_message()));
            }
        }
        outcome
    }

    fn publish(&self, name: String, parent: &str, success: bool, result: Value) {
        let completed = CompletedEvent {
            name,
            parent: parent.to_string(),
            success,
            result,
            completed_at: Utc::now(),
        };

        // No subscribers is the normal case outside of tests
        if self.completed.send(completed).is_err() {
            debug!("No completion watchers for event {}", parent);
        }
    }
}

impl Default for ActionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for the completion named `name` whose parent is `parent`
pub async fn wait_for(
    watcher: &mut broadcast::Receiver<CompletedEvent>,
    name: &str,
    parent: &str,
    timeout: Duration,
) -> ActionResult<CompletedEvent> {
    let wait = async {
        loop {
            match watcher.recv().await {
                Ok(event) if event.name == name && event.parent == parent => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Completion watcher lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(ActionError::Internal("event bus closed".to_string()));
                }
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| ActionError::timeout(format!("no {} for event {} within {:?}", name, parent, timeout)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::SetEventMitigations;
    use crate::models::{ActionMessage, IncidentSnapshot};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct EchoHandler;

    #[async_trait]
    impl ActionHandler for EchoHandler {
        fn action_name(&self) -> &'static str {
            "echo"
        }

        async fn handle(&self, message: &ActionMessage) -> ActionResult<String> {
            Ok(format!("echo {}", message.incident.id))
        }
    }

    fn bus() -> ActionBus {
        let mut bus = ActionBus::new();
        bus.register_action("actions.test", Arc::new(EchoHandler));
        bus.register_function(Arc::new(SetEventMitigations));
        bus
    }

    #[tokio::test]
    async fn test_action_routing_and_completion() {
        let bus = bus();
        let mut watcher = bus.watch();

        let event = ActionEvent::new("echo", IncidentSnapshot::new(3, 1));
        let id = event.id.clone();
        let status = bus.fire_action("actions.test", event).await.unwrap();
        assert_eq!(status.status, "echo 3");

        let completed = wait_for(&mut watcher, "echo_result", &id, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(completed.success);
        assert_eq!(completed.result, json!("echo 3"));
    }

    #[tokio::test]
    async fn test_unknown_action_and_channel() {
        let bus = bus();
        let event = ActionEvent::new("nope", IncidentSnapshot::new(3, 1));
        assert!(matches!(
            bus.fire_action("actions.test", event).await,
            Err(ActionError::UnknownAction(_))
        ));

        let event = ActionEvent::new("echo", IncidentSnapshot::new(3, 1));
        assert!(bus.fire_action("actions.other", event).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let bus = bus();
        let result = bus.fire_function(FunctionEvent::new("missing", Map::new())).await;
        assert!(matches!(result, Err(ActionError::UnknownFunction(_))));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let bus = bus();
        let mut watcher = bus.watch();
        let result = wait_for(&mut watcher, "echo_result", "never-fired", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(ActionError::Timeout { .. })));
    }

    #[test]
    fn test_registry_listing() {
        let bus = bus();
        assert_eq!(bus.channels(), vec!["actions.test".to_string()]);
        assert_eq!(bus.function_names(), vec!["set_event_mitigations"]);
    }
}
