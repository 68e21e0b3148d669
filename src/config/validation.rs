//! Configuration validation for the soar-actions service

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn, error};
use validator::Validate;

use crate::config::settings::{AddGroupConfig, PlatformConfig, ServerConfig, Settings};

/// Comprehensive configuration validator
pub struct ConfigurationValidator {
    /// Whether to perform strict validation (fails on warnings)
    strict_mode: bool,
    /// List of validation warnings
    warnings: Vec<String>,
    /// List of validation errors
    errors: Vec<String>,
}

impl ConfigurationValidator {
    pub fn new(strict_mode: bool) -> Self {
        Self {
            strict_mode,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Validate complete configuration
    pub fn validate_settings(&mut self, settings: &Settings) -> Result<()> {
        info!("Starting configuration validation");

        if let Err(validation_errors) = settings.validate() {
            for (field, errors) in validation_errors.field_errors() {
                for error in errors {
                    self.errors.push(format!(
                        "Field '{}': {}",
                        field,
                        error.message.as_ref().map(|m| m.as_ref()).unwrap_or("validation error")
                    ));
                }
            }
            // Nested structs report their failures as a single error tree
            for (section, kind) in validation_errors.errors() {
                if matches!(kind, validator::ValidationErrorsKind::Struct(_)) {
                    self.errors.push(format!("Section '{}' is invalid: {}", section, kind_summary(kind)));
                }
            }
        }

        self.validate_server_config(&settings.server);
        self.validate_platform_config(&settings.resilient);
        self.validate_assignment_config(&settings.addgroup);

        self.print_validation_summary();

        if !self.errors.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration validation failed with {} errors",
                self.errors.len()
            ));
        }

        if self.strict_mode && !self.warnings.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration validation failed in strict mode with {} warnings",
                self.warnings.len()
            ));
        }

        info!("Configuration validation passed");
        Ok(())
    }

    fn validate_server_config(&mut self, server_config: &ServerConfig) {
        match server_config.transport.as_str() {
            "stdio" => {
                info!("Transport: stdio");
            }
            "socket" => {
                match &server_config.socket_path {
                    None => {
                        self.errors.push("Socket transport requires socket_path to be set".to_string());
                    }
                    Some(path) => {
                        if let Some(parent) = Path::new(path).parent() {
                            if !parent.as_os_str().is_empty() && !parent.exists() {
                                self.errors.push(format!("Socket path parent directory does not exist: {:?}", parent));
                            }
                        }
                    }
                }
            }
            other => {
                self.errors.push(format!("Invalid transport type: {}. Must be 'stdio' or 'socket'", other));
            }
        }

        match server_config.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {},
            other => {
                self.warnings.push(format!("Non-standard log level: {}. Recommended: trace, debug, info, warn, error", other));
            }
        }
    }

    fn validate_platform_config(&mut self, platform: &PlatformConfig) {
        match (&platform.api_key_id, &platform.api_key_secret) {
            (Some(id), Some(secret)) => {
                if id.is_empty() || secret.is_empty() {
                    self.errors.push("API key id and secret must not be empty".to_string());
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                self.errors.push("api_key_id and api_key_secret must be configured together".to_string());
            }
            (None, None) => {
                self.warnings.push("No API key configured; platform calls will be unauthenticated".to_string());
            }
        }

        if !platform.verify_tls {
            self.warnings.push("verify_tls is disabled. Enable for production environments".to_string());
        }

        if platform.base_url.starts_with("http://") {
            self.warnings.push(format!("Platform URL {} is not using TLS", platform.base_url));
        }
    }

    /// A missing key for a severity tier propagates as a null token at runtime,
    /// so it is only a warning unless strict mode is on.
    fn validate_assignment_config(&mut self, addgroup: &AddGroupConfig) {
        let keys = [
            ("high_owner", &addgroup.high_owner),
            ("medium_owner", &addgroup.medium_owner),
            ("low_owner", &addgroup.low_owner),
            ("high_member_1", &addgroup.high_member_1),
            ("medium_member_1", &addgroup.medium_member_1),
            ("medium_member_2", &addgroup.medium_member_2),
            ("low_member_1", &addgroup.low_member_1),
            ("low_member_2", &addgroup.low_member_2),
            ("low_member_3", &addgroup.low_member_3),
        ];

        for (key, value) in keys {
            match value.as_deref() {
                None => self.warnings.push(format!(
                    "addgroup.{} is not set; a null value will be written for that severity",
                    key
                )),
                Some("") => self.warnings.push(format!("addgroup.{} is empty", key)),
                Some(_) => {}
            }
        }
    }

    fn print_validation_summary(&self) {
        if !self.warnings.is_empty() {
            warn!("Configuration warnings ({}):", self.warnings.len());
            for (i, warning) in self.warnings.iter().enumerate() {
                warn!("  {}: {}", i + 1, warning);
            }
        }

        if !self.errors.is_empty() {
            error!("Configuration errors ({}):", self.errors.len());
            for (i, error) in self.errors.iter().enumerate() {
                error!("  {}: {}", i + 1, error);
            }
        }

        if self.warnings.is_empty() && self.errors.is_empty() {
            info!("Configuration validation completed successfully with no issues");
        } else {
            info!(
                "Configuration validation completed with {} warnings and {} errors",
                self.warnings.len(),
                self.errors.len()
            );
        }
    }

    /// Get validation warnings
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get validation errors
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

fn kind_summary(kind: &validator::ValidationErrorsKind) -> String {
    match kind {
        validator::ValidationErrorsKind::Struct(inner) => inner
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// Quick validation function for use in main application
pub fn validate_configuration(settings: &Settings, strict: bool) -> Result<()> {
    let mut validator = ConfigurationValidator::new(strict);
    validator.validate_settings(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_settings() -> Settings {
        Settings {
            server: ServerConfig {
                transport: "stdio".to_string(),
                socket_path: Some("/tmp/soar-actions.sock".to_string()),
                log_level: "info".to_string(),
            },
            resilient: PlatformConfig {
                base_url: "https://soar.example.com".to_string(),
                org: "Example Org".to_string(),
                api_key_id: Some("key-id".to_string()),
                api_key_secret: Some("key-secret".to_string()),
                verify_tls: true,
                timeout_secs: 30,
                label_cache_size: 32,
            },
            addgroup: AddGroupConfig {
                queue: "addgroup".to_string(),
                high_owner: Some("high.owner@example.com".to_string()),
                medium_owner: Some("medium.owner@example.com".to_string()),
                low_owner: Some("low.owner@example.com".to_string()),
                high_member_1: Some("h1@example.com".to_string()),
                medium_member_1: Some("m1@example.com".to_string()),
                medium_member_2: Some("m2@example.com".to_string()),
                low_member_1: Some("l1@example.com".to_string()),
                low_member_2: Some("l2@example.com".to_string()),
                low_member_3: Some("l3@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_valid_configuration() {
        let settings = create_test_settings();
        let mut validator = ConfigurationValidator::new(true);

        let result = validator.validate_settings(&settings);
        assert!(result.is_ok(), "Complete configuration should pass strict validation");
        assert!(validator.warnings().is_empty());
    }

    #[test]
    fn test_invalid_transport() {
        let mut settings = create_test_settings();
        settings.server.transport = "invalid".to_string();

        let mut validator = ConfigurationValidator::new(false);
        let result = validator.validate_settings(&settings);

        assert!(result.is_err(), "Invalid transport should fail validation");
        assert!(!validator.errors().is_empty());
    }

    #[test]
    fn test_half_configured_api_key() {
        let mut settings = create_test_settings();
        settings.resilient.api_key_secret = None;

        let mut validator = ConfigurationValidator::new(false);
        assert!(validator.validate_settings(&settings).is_err());
    }

    #[test]
    fn test_missing_assignment_key_warns_in_lenient_mode() {
        let mut settings = create_test_settings();
        settings.addgroup.low_member_3 = None;

        let mut validator = ConfigurationValidator::new(false);
        let result = validator.validate_settings(&settings);

        assert!(result.is_ok(), "Missing key is only a warning in lenient mode");
        assert!(validator.warnings().iter().any(|w| w.contains("low_member_3")));
    }

    #[test]
    fn test_missing_assignment_key_fails_in_strict_mode() {
        let mut settings = create_test_settings();
        settings.addgroup.high_owner = None;

        let mut validator = ConfigurationValidator::new(true);
        assert!(validator.validate_settings(&settings).is_err());
        assert!(validator.warnings().iter().any(|w| w.contains("high_owner")));
    }

    #[test]
    fn test_bad_url_is_an_error() {
        let mut settings = create_test_settings();
        settings.resilient.base_url = "soar.example.com".to_string();

        let mut validator = ConfigurationValidator::new(false);
        assert!(validator.validate_settings(&settings).is_err());
        assert!(!validator.errors().is_empty());
    }
}
