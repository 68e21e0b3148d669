//! soar-actions service assembly: platform client, action bus and JSON-RPC server

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    bus::ActionBus,
    config::{validate_configuration, Settings},
    functions::SetEventMitigations,
    handlers::AddGroupHandler,
    jsonrpc::{register_action_methods, JsonRpcServer, TransportConfig},
    platform::{IncidentPlatform, RestPlatformClient},
    policy::AssignmentConfig,
};

/// Wire every component onto a fresh bus using `platform` for incident access
pub fn build_bus(settings: &Settings, platform: Arc<dyn IncidentPlatform>) -> ActionBus {
    let assignments = Arc::new(AssignmentConfig::from(&settings.addgroup));

    let mut bus = ActionBus::new();
    bus.register_action(
        settings.addgroup.channel(),
        Arc::new(AddGroupHandler::new(platform, assignments)),
    );
    bus.register_function(Arc::new(SetEventMitigations));
    bus
}

/// Build the service from `settings` and serve until the client disconnects
/// or the process is interrupted
pub async fn start_server(
    settings: Arc<Settings>,
    transport_config: Option<TransportConfig>,
    strict: bool,
) -> Result<()> {
    info!("Starting soar-actions service");

    validate_configuration(&settings, strict)?;
    validate_server_config(&settings)?;

    let transport = match transport_config {
        Some(transport) => transport,
        None => TransportConfig::from_settings(&settings.server, None)?,
    };

    let platform = RestPlatformClient::new(&settings.resilient)
        .context("Failed to create platform client")?;
    let bus = Arc::new(build_bus(&settings, Arc::new(platform)));

    let mut server = JsonRpcServer::new(transport.clone()).await?;
    register_action_methods(server.registry(), bus).await;

    info!("Listening for actions with {} transport", transport.description());
    server.start().await?;

    info!("soar-actions service stopped");
    Ok(())
}

/// Validate the `[server]` section before starting
pub fn validate_server_config(settings: &Settings) -> Result<()> {
    match TransportConfig::from_settings(&settings.server, None)? {
        TransportConfig::Stdio => {
            debug!("Using stdio transport - no additional validation needed");
        }
        TransportConfig::UnixSocket { path } => {
            if path.is_empty() {
                anyhow::bail!("Socket path cannot be empty");
            }
            debug!("Using Unix socket transport: {}", path);
        }
    }

    Ok(())
}
