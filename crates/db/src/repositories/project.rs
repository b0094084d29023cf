use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use ipms_core::domain::project::{Project, ProjectId, ProjectPriority, ProjectStatus};

use super::{ProjectRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProjectRepository {
    pool: DbPool,
}

impl SqlProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_status(s: &str) -> Result<ProjectStatus, RepositoryError> {
    match s {
        "planned" => Ok(ProjectStatus::Planned),
        "ongoing" => Ok(ProjectStatus::Ongoing),
        "completed" => Ok(ProjectStatus::Completed),
        "suspended" => Ok(ProjectStatus::Suspended),
        other => Err(RepositoryError::Decode(format!("unknown project status `{other}`"))),
    }
}

pub fn project_status_as_str(status: &ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Planned => "planned",
        ProjectStatus::Ongoing => "ongoing",
        ProjectStatus::Completed => "completed",
        ProjectStatus::Suspended => "suspended",
    }
}

fn parse_priority(s: &str) -> Result<ProjectPriority, RepositoryError> {
    match s {
        "low" => Ok(ProjectPriority::Low),
        "medium" => Ok(ProjectPriority::Medium),
        "high" => Ok(ProjectPriority::High),
        other => Err(RepositoryError::Decode(format!("unknown project priority `{other}`"))),
    }
}

pub fn project_priority_as_str(priority: &ProjectPriority) -> &'static str {
    match priority {
        ProjectPriority::Low => "low",
        ProjectPriority::Medium => "medium",
        ProjectPriority::High => "high",
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("bad decimal in `{field}`: {error}")))
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<Project, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let id: String = row.try_get("id").map_err(decode)?;
    let code: String = row.try_get("code").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let location: String = row.try_get("location").map_err(decode)?;
    let sector: String = row.try_get("sector").map_err(decode)?;
    let budget_str: String = row.try_get("budget").map_err(decode)?;
    let status_str: String = row.try_get("status").map_err(decode)?;
    let priority_str: String = row.try_get("priority").map_err(decode)?;
    let created_at_str: String = row.try_get("created_at").map_err(decode)?;
    let updated_at_str: String = row.try_get("updated_at").map_err(decode)?;

    Ok(Project {
        id: ProjectId(id),
        code,
        name,
        location,
        sector,
        budget: parse_decimal("budget", &budget_str)?,
        status: parse_status(&status_str)?,
        priority: parse_priority(&priority_str)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

#[async_trait::async_trait]
impl ProjectRepository for SqlProjectRepository {
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, code, name, location, sector, budget, status, priority,
                    created_at, updated_at
             FROM project WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_project(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, project: Project) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO project (id, code, name, location, sector, budget, status, priority,
                                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 code = excluded.code,
                 name = excluded.name,
                 location = excluded.location,
                 sector = excluded.sector,
                 budget = excluded.budget,
                 status = excluded.status,
                 priority = excluded.priority,
                 updated_at = excluded.updated_at",
        )
        .bind(&project.id.0)
        .bind(&project.code)
        .bind(&project.name)
        .bind(&project.location)
        .bind(&project.sector)
        .bind(project.budget.to_string())
        .bind(project_status_as_str(&project.status))
        .bind(project_priority_as_str(&project.priority))
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, code, name, location, sector, budget, status, priority,
                    created_at, updated_at
             FROM project ORDER BY code ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_project).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use ipms_core::domain::project::{Project, ProjectId, ProjectPriority, ProjectStatus};

    use super::SqlProjectRepository;
    use crate::repositories::ProjectRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    pub(crate) fn sample_project(id: &str, code: &str) -> Project {
        let now = Utc::now();
        Project {
            id: ProjectId(id.to_string()),
            code: code.to_string(),
            name: "Farm-to-market road rehabilitation".to_string(),
            location: "Barangay San Isidro".to_string(),
            sector: "roads".to_string(),
            budget: Decimal::new(2_500_000_00, 2),
            status: ProjectStatus::Ongoing,
            priority: ProjectPriority::High,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_all_fields() {
        let pool = setup().await;
        let repo = SqlProjectRepository::new(pool);
        let project = sample_project("PRJ-001", "FMR-2026-001");

        repo.save(project.clone()).await.expect("save");
        let found = repo
            .find_by_id(&ProjectId("PRJ-001".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.code, project.code);
        assert_eq!(found.budget, project.budget);
        assert_eq!(found.status, ProjectStatus::Ongoing);
        assert_eq!(found.priority, ProjectPriority::High);
    }

    #[tokio::test]
    async fn save_upserts_on_conflict() {
        let pool = setup().await;
        let repo = SqlProjectRepository::new(pool);

        let mut project = sample_project("PRJ-001", "FMR-2026-001");
        repo.save(project.clone()).await.expect("save");

        project.status = ProjectStatus::Completed;
        project.updated_at = Utc::now();
        repo.save(project).await.expect("upsert");

        let found = repo
            .find_by_id(&ProjectId("PRJ-001".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn list_orders_by_code() {
        let pool = setup().await;
        let repo = SqlProjectRepository::new(pool);

        repo.save(sample_project("PRJ-002", "WTR-2026-014")).await.expect("save 2");
        repo.save(sample_project("PRJ-001", "FMR-2026-001")).await.expect("save 1");

        let projects = repo.list().await.expect("list");
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].code, "FMR-2026-001");
    }
}
