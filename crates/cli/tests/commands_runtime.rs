use std::env;
use std::sync::{Mutex, OnceLock};

use ipms_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("IPMS_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_unsupported_database() {
    with_env(&[("IPMS_DATABASE_URL", "postgres://localhost/ipms")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_and_reports_the_demo_projects() {
    with_env(&[("IPMS_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("FMR-2026-001"));
        assert!(message.contains("WTR-2026-014"));
        assert!(message.contains("SCH-2026-003"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("IPMS_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn doctor_reports_missing_schema_on_a_fresh_database() {
    with_env(&[("IPMS_DATABASE_URL", "sqlite::memory:")], || {
        let report: Value = serde_json::from_str(&doctor::run(true))
            .expect("doctor --json output should be valid JSON");

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");
        let by_name = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .unwrap_or_else(|| panic!("missing check `{name}`"))
        };
        assert_eq!(by_name("config_validation")["status"], "pass");
        assert_eq!(by_name("database_connectivity")["status"], "pass");
        assert_eq!(by_name("baseline_schema")["status"], "fail");
    });
}

#[test]
fn doctor_skips_downstream_checks_when_config_is_invalid() {
    with_env(&[("IPMS_DATABASE_URL", "postgres://localhost/ipms")], || {
        let report: Value = serde_json::from_str(&doctor::run(true))
            .expect("doctor --json output should be valid JSON");

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert_eq!(checks[1]["status"], "skipped");
    });
}

#[test]
fn config_attributes_env_overrides_to_their_variables() {
    with_env(&[("IPMS_DATABASE_URL", "sqlite::memory:")], || {
        let output = config::run();

        assert!(output.contains("effective config"));
        assert!(output.contains("database.url = sqlite::memory: (source: env (IPMS_DATABASE_URL))"));
        assert!(output.contains("server.port = 8080 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "IPMS_DATABASE_URL",
        "IPMS_DATABASE_MAX_CONNECTIONS",
        "IPMS_DATABASE_TIMEOUT_SECS",
        "IPMS_SERVER_BIND_ADDRESS",
        "IPMS_SERVER_PORT",
        "IPMS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "IPMS_LOGGING_LEVEL",
        "IPMS_LOGGING_FORMAT",
        "IPMS_LOG_LEVEL",
        "IPMS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
