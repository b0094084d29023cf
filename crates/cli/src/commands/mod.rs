//! Shared envelope for the `ipms` operator commands.
//!
//! Every subcommand prints a single JSON `CommandOutcome` and exits with a
//! class-specific code, so deployment scripts wrapping `ipms migrate` or
//! `ipms seed` can branch on the code without parsing output. Failure
//! classes, in the order a fresh environment hits them: configuration that
//! does not validate, an async runtime that fails to start, a database that
//! cannot be reached, a migration or seed load that errors, and a seed
//! contract that loaded but did not verify.

pub mod config;
pub mod doctor;
pub mod migrate;
pub mod seed;

use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_CONNECTIVITY: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_VERIFICATION: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// The printed payload. `error_class` names the failure bucket above and is
/// omitted on success.
#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{CommandResult, EXIT_VERIFICATION};

    #[test]
    fn success_envelope_omits_error_class() {
        let result = CommandResult::success("migrate", "database schema is current");

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"status\":\"ok\""));
        assert!(!result.output.contains("error_class"));
    }

    #[test]
    fn failure_envelope_names_its_class_and_exit_code() {
        let result = CommandResult::failure(
            "seed",
            "seed_verification",
            "seed verification failed for checks: project PRJ-SEED-001 exists",
            EXIT_VERIFICATION,
        );

        assert_eq!(result.exit_code, 6);
        assert!(result.output.contains("\"error_class\":\"seed_verification\""));
        assert!(result.output.contains("\"command\":\"seed\""));
    }
}
