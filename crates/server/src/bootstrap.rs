use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use ipms_core::audit::{AuditSink, TracingAuditSink};
use ipms_core::config::{AppConfig, ConfigError, LoadOptions};
use ipms_core::workflow::policy::ReviewPolicy;
use ipms_core::WorkflowEngine;
use ipms_db::repositories::{
    DecisionRepository, ProjectRepository, SqlDecisionRepository, SqlProjectRepository,
    SqlSubmissionRepository, SubmissionRepository,
};
use ipms_db::{connect_with_settings, migrations, DbPool};

/// Everything a request handler needs, wired once at startup.
#[derive(Clone)]
pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: WorkflowEngine,
    pub projects: Arc<dyn ProjectRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub decisions: Arc<dyn DecisionRepository>,
    pub audit: Arc<dyn AuditSink>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application {
        config,
        engine: WorkflowEngine::new(ReviewPolicy::default()),
        projects: Arc::new(SqlProjectRepository::new(db_pool.clone())),
        submissions: Arc::new(SqlSubmissionRepository::new(db_pool.clone())),
        decisions: Arc::new(SqlDecisionRepository::new(db_pool.clone())),
        audit: Arc::new(TracingAuditSink),
        db_pool,
    })
}

#[cfg(test)]
mod tests {
    use ipms_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn in_memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_repositories() {
        let app = bootstrap(in_memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('project', 'submission', 'decision')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables after bootstrap");
        assert_eq!(table_count, 3);

        let projects = app.projects.list().await.expect("empty project list");
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_urls() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/ipms".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
    }
}
