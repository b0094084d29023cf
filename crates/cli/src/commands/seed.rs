use crate::commands::{
    CommandResult, EXIT_CONFIG, EXIT_CONNECTIVITY, EXIT_MIGRATION, EXIT_RUNTIME, EXIT_VERIFICATION,
};
use ipms_core::config::{AppConfig, LoadOptions};
use ipms_db::fixtures::ProjectSeedInfo;
use ipms_db::{connect_with_settings, migrations, SeedDataset};

struct SeedOutput {
    projects: Vec<ProjectSeedInfo>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), EXIT_CONNECTIVITY))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        let run_result: Result<SeedOutput, (&'static str, String, u8)> =
            if !verification.all_present {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                    .collect::<Vec<_>>();
                let message = if failed_checks.is_empty() {
                    "some seed data failed to load".to_string()
                } else {
                    format!("seed verification failed for checks: {}", failed_checks.join(", "))
                };
                Err(("seed_verification", message, EXIT_VERIFICATION))
            } else {
                Ok(SeedOutput { projects: seed_result.projects_seeded })
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let project_lines: Vec<String> = output
                .projects
                .iter()
                .map(|p| format!("  - {}: {} ({})", p.code, p.project_id, p.description))
                .collect();
            CommandResult::success(
                "seed",
                format!("loaded demo dataset:\n{}", project_lines.join("\n")),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
