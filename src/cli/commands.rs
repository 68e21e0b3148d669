//! CLI command implementations.

use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::client::JsonRpcClient;
use crate::config::{ConfigurationValidator, Settings};
use crate::functions::customization_definitions;
use crate::handlers::ADD_GROUP_ACTION;
use crate::jsonrpc::{TransportConfig, ACTION_CHANNEL_PREFIX};
use crate::models::{ActionEvent, FunctionEvent, IncidentId, IncidentSnapshot};
use crate::server::start_server;

use super::utils::{load_json_object, load_settings, parse_severity_code, resolve_socket};

/// Start the soar-actions service
pub async fn serve(
    config_path: Option<PathBuf>,
    transport: Option<String>,
    socket_path: Option<String>,
    strict: bool,
) -> Result<()> {
    info!("Loading configuration...");
    let mut settings = load_settings(config_path.as_deref())?;

    if let Some(transport) = transport {
        settings.server.transport = transport;
    }
    if socket_path.is_some() {
        settings.server.socket_path = socket_path;
    }
    let transport_config = TransportConfig::from_settings(&settings.server, None)?;

    info!("Initializing service with transport: {}", transport_config.description());
    start_server(Arc::new(settings), Some(transport_config), strict).await?;

    info!("soar-actions service stopped");
    Ok(())
}

/// Fire an add_group action at a running service
pub async fn fire(
    config_path: Option<PathBuf>,
    socket: Option<String>,
    incident_id: IncidentId,
    severity_code: Option<String>,
    queue: Option<String>,
) -> Result<()> {
    let settings = load_settings(config_path.as_deref())?;
    let client = JsonRpcClient::new(resolve_socket(socket, &settings));

    let channel = match queue {
        Some(queue) => format!("{}{}", ACTION_CHANNEL_PREFIX, queue),
        None => settings.addgroup.channel(),
    };

    let code = severity_code
        .as_deref()
        .map(parse_severity_code)
        .unwrap_or(Value::Null);
    let event = ActionEvent::new(ADD_GROUP_ACTION, IncidentSnapshot::with_id(incident_id, code));

    info!("Firing {} on {} via {}", ADD_GROUP_ACTION, channel, client.socket_path());
    let status = client.fire_action(&channel, &event).await?;

    println!("{}", status.status);
    Ok(())
}

/// Submit a function event to a running service and print its result
pub async fn submit_function(
    config_path: Option<PathBuf>,
    socket: Option<String>,
    function: String,
    inputs: Option<String>,
    inputs_file: Option<PathBuf>,
) -> Result<()> {
    let settings = load_settings(config_path.as_deref())?;
    let client = JsonRpcClient::new(resolve_socket(socket, &settings));

    let inputs = load_json_object(inputs, inputs_file, "inputs")?;
    let event = FunctionEvent::new(function, inputs);

    info!("Submitting function {} via {}", event.function, client.socket_path());
    let result = client.submit_function(&event).await?;

    println!("{}", serde_json::to_string_pretty(&result.value)?);
    Ok(())
}

/// Print the shipped function definitions
pub async fn functions(package: Option<String>) -> Result<()> {
    let definitions: Vec<_> = customization_definitions()
        .into_iter()
        .filter(|def| package.as_deref().map_or(true, |p| def.package == p))
        .collect();

    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}

/// Initialize default configuration
pub async fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::config_path);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_content = toml::to_string_pretty(&Settings::default())?;
    std::fs::write(&config_path, toml_content)?;

    println!("✓ Configuration initialized at {:?}", config_path);
    Ok(())
}

/// Manage configuration (show, validate)
pub async fn config_command(
    config_path: Option<PathBuf>,
    show: bool,
    validate: bool,
    strict: bool,
) -> Result<()> {
    let settings = load_settings(config_path.as_deref())?;

    if show {
        println!("{}", toml::to_string_pretty(&settings)?);
    }

    if validate {
        let mut validator = ConfigurationValidator::new(strict);
        match validator.validate_settings(&settings) {
            Ok(()) => println!("✓ Configuration is valid ({} warnings)", validator.warnings().len()),
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                for message in validator.errors() {
                    println!("  ✗ {}", message);
                }
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Show version information
pub async fn version() -> Result<()> {
    println!("soar-actions {}", env!("CARGO_PKG_VERSION"));
    println!("Built with Rust {}", rustc_version::version()?);
    Ok(())
}
