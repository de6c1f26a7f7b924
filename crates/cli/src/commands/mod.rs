pub mod catalog;
pub mod config;
pub mod doctor;
pub mod recommend;

use std::path::PathBuf;

use bapsim_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG_VALIDATION: u8 = 2;
pub const EXIT_CATALOG_UNAVAILABLE: u8 = 4;
pub const EXIT_ENGINE_FAILURE: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(
                    command,
                    "serialization",
                    format!("could not serialize command data: {error}"),
                    EXIT_ENGINE_FAILURE,
                )
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_payload(command, error_class, message.into(), exit_code, None)
    }

    /// Failure that names the correlation id the engine logged the error under.
    pub fn traced_failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        correlation_id: &str,
    ) -> Self {
        Self::failure_payload(
            command,
            error_class,
            message.into(),
            exit_code,
            Some(correlation_id.to_string()),
        )
    }

    fn failure_payload(
        command: &str,
        error_class: &str,
        message: String,
        exit_code: u8,
        correlation_id: Option<String>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message,
            data: None,
            correlation_id,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Loads config for a command, pointing the catalog at `catalog_path` when given.
pub(crate) fn load_config(
    command: &str,
    catalog_path: Option<PathBuf>,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { catalog_path, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    })
    .map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("config validation failed: {error}"),
            EXIT_CONFIG_VALIDATION,
        )
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
