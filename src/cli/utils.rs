//! CLI utility functions.

use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::settings::DEFAULT_SOCKET_PATH;
use crate::config::{apply_log_level, Settings};

/// Load settings from an explicit file or the default location and switch
/// logging to the configured level
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = config_path {
        info!("Using config file: {}", path.display());
    }
    let settings = Settings::load_from(config_path)?;

    if let Err(e) = apply_log_level(&settings.server.log_level) {
        warn!("Ignoring log level '{}': {}", settings.server.log_level, e);
    }
    Ok(settings)
}

/// Socket to reach a running service: explicit flag, then settings, then default
pub fn resolve_socket(socket: Option<String>, settings: &Settings) -> String {
    socket
        .or_else(|| settings.server.socket_path.clone())
        .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string())
}

/// Severity codes are usually numeric ids; anything else is sent as text
pub fn parse_severity_code(raw: &str) -> Value {
    match raw.trim().parse::<i64>() {
        Ok(code) => Value::from(code),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Load a JSON object from a file or an inline string
pub fn load_json_object(
    inline: Option<String>,
    file: Option<PathBuf>,
    what: &str,
) -> Result<Map<String, Value>> {
    let (content, source) = match (inline, file) {
        (Some(json), None) => (json, "inline JSON".to_string()),
        (None, Some(path)) => {
            if !path.exists() {
                bail!("{} file not found: {}", what, path.display());
            }
            (std::fs::read_to_string(&path)?, path.display().to_string())
        }
        (None, None) => return Ok(Map::new()),
        (Some(_), Some(_)) => bail!("Cannot use both inline {} and a {} file", what, what),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(anyhow!("{} from {} must be a JSON object, got {}", what, source, other)),
        Err(e) => Err(anyhow!("Failed to parse {} from {}: {}", what, source, e)),
    }
}
