use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Per-project expectations the seed SQL must satisfy.
struct SeedProjectContract {
    project_id: &'static str,
    code: &'static str,
    sector: &'static str,
    expected_submission_count: i64,
    description: &'static str,
}

/// Per-submission expectations: the denormalized status and the number of
/// decisions logged against it.
struct SeedSubmissionContract {
    submission_id: &'static str,
    status: &'static str,
    expected_decision_count: i64,
}

const SEED_PROJECTS: &[SeedProjectContract] = &[
    SeedProjectContract {
        project_id: "PRJ-SEED-001",
        code: "FMR-2026-001",
        sector: "roads",
        expected_submission_count: 3,
        description: "Road project with approved, returned, and resubmitted deliverables",
    },
    SeedProjectContract {
        project_id: "PRJ-SEED-002",
        code: "WTR-2026-014",
        sector: "water",
        expected_submission_count: 2,
        description: "Water project with a rejected expense and an in-flight progress update",
    },
    SeedProjectContract {
        project_id: "PRJ-SEED-003",
        code: "SCH-2026-003",
        sector: "education",
        expected_submission_count: 1,
        description: "School project with a verified status-change request",
    },
];

const SEED_SUBMISSIONS: &[SeedSubmissionContract] = &[
    SeedSubmissionContract { submission_id: "SUB-SEED-001", status: "approved", expected_decision_count: 1 },
    SeedSubmissionContract { submission_id: "SUB-SEED-002", status: "returned", expected_decision_count: 1 },
    SeedSubmissionContract { submission_id: "SUB-SEED-003", status: "pending", expected_decision_count: 0 },
    SeedSubmissionContract { submission_id: "SUB-SEED-004", status: "rejected", expected_decision_count: 1 },
    SeedSubmissionContract { submission_id: "SUB-SEED-005", status: "under_review", expected_decision_count: 0 },
    SeedSubmissionContract { submission_id: "SUB-SEED-006", status: "verified", expected_decision_count: 1 },
];

#[derive(Debug)]
pub struct ProjectSeedInfo {
    pub project_id: &'static str,
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub projects_seeded: Vec<ProjectSeedInfo>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

/// Deterministic dataset covering every submission lifecycle stage, including
/// one returned-then-resubmitted version chain.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let projects_seeded = SEED_PROJECTS
            .iter()
            .map(|project| ProjectSeedInfo {
                project_id: project.project_id,
                code: project.code,
                description: project.description,
            })
            .collect();

        Ok(SeedResult { projects_seeded })
    }

    /// Check the loaded data against the seed contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for project in SEED_PROJECTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM project WHERE id = ?1 AND code = ?2 AND sector = ?3)",
            )
            .bind(project.project_id)
            .bind(project.code)
            .bind(project.sector)
            .fetch_one(pool)
            .await?;
            checks.push((format!("{} exists", project.project_id), exists == 1));

            let submission_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM submission WHERE project_id = ?1")
                    .bind(project.project_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((
                format!("{} submission count", project.project_id),
                submission_count == project.expected_submission_count,
            ));
        }

        for submission in SEED_SUBMISSIONS {
            let status_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM submission WHERE id = ?1 AND current_status = ?2)",
            )
            .bind(submission.submission_id)
            .bind(submission.status)
            .fetch_one(pool)
            .await?;
            checks.push((format!("{} status", submission.submission_id), status_ok == 1));

            let decision_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM decision WHERE submission_id = ?1")
                    .bind(submission.submission_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((
                format!("{} decision count", submission.submission_id),
                decision_count == submission.expected_decision_count,
            ));
        }

        let chain_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM submission
             WHERE id = 'SUB-SEED-003' AND supersedes = 'SUB-SEED-002' AND version_no = 2)",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("resubmission chain".to_string(), chain_ok == 1));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::SeedDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_loads_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let result = SeedDataset::load(&pool).await.expect("load seed");
        assert_eq!(result.projects_seeded.len(), 3);

        let verification = SeedDataset::verify(&pool).await.expect("verify seed");
        for (check, ok) in &verification.checks {
            assert!(ok, "seed check failed: {check}");
        }
        assert!(verification.all_present);
    }

    #[tokio::test]
    async fn seed_load_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        SeedDataset::load(&pool).await.expect("first load");
        SeedDataset::load(&pool).await.expect("second load");

        let verification = SeedDataset::verify(&pool).await.expect("verify seed");
        assert!(verification.all_present);
    }
}
