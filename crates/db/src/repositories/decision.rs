use sqlx::Row;

use ipms_core::domain::decision::{Decision, DecisionId};
use ipms_core::domain::submission::SubmissionId;

use super::project::parse_timestamp;
use super::submission::parse_role;
use super::{DecisionRepository, NewDecision, RepositoryError};
use crate::DbPool;

pub struct SqlDecisionRepository {
    pool: DbPool,
}

impl SqlDecisionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(e.to_string())
}

fn row_to_decision(row: &sqlx::sqlite::SqliteRow) -> Result<Decision, RepositoryError> {
    let seq: i64 = row.try_get("seq").map_err(decode)?;
    let id: String = row.try_get("id").map_err(decode)?;
    let submission_id: String = row.try_get("submission_id").map_err(decode)?;
    let outcome_str: String = row.try_get("outcome").map_err(decode)?;
    let remarks: Option<String> = row.try_get("remarks").map_err(decode)?;
    let decided_by: String = row.try_get("decided_by").map_err(decode)?;
    let decided_by_role_str: String = row.try_get("decided_by_role").map_err(decode)?;
    let decided_at_str: String = row.try_get("decided_at").map_err(decode)?;

    Ok(Decision {
        id: DecisionId(id),
        submission_id: SubmissionId(submission_id),
        outcome: outcome_str
            .parse()
            .map_err(|_| RepositoryError::Decode(format!("unknown decision outcome `{outcome_str}`")))?,
        remarks,
        decided_by,
        decided_by_role: parse_role(&decided_by_role_str)?,
        seq,
        decided_at: parse_timestamp(&decided_at_str),
    })
}

#[async_trait::async_trait]
impl DecisionRepository for SqlDecisionRepository {
    async fn append(&self, decision: NewDecision) -> Result<Decision, RepositoryError> {
        let seq: i64 = sqlx::query(
            "INSERT INTO decision
                (id, submission_id, outcome, remarks, decided_by, decided_by_role, decided_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING seq",
        )
        .bind(&decision.id.0)
        .bind(&decision.submission_id.0)
        .bind(decision.outcome.as_str())
        .bind(&decision.remarks)
        .bind(&decision.decided_by)
        .bind(decision.decided_by_role.as_str())
        .bind(decision.decided_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await?
        .try_get("seq")
        .map_err(decode)?;

        Ok(Decision {
            id: decision.id,
            submission_id: decision.submission_id,
            outcome: decision.outcome,
            remarks: decision.remarks,
            decided_by: decision.decided_by,
            decided_by_role: decision.decided_by_role,
            seq,
            decided_at: decision.decided_at,
        })
    }

    async fn list_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<Decision>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT seq, id, submission_id, outcome, remarks, decided_by, decided_by_role,
                    decided_at
             FROM decision WHERE submission_id = ? ORDER BY seq DESC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_decision).collect()
    }

    async fn latest_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Decision>, RepositoryError> {
        let row = sqlx::query(
            "SELECT seq, id, submission_id, outcome, remarks, decided_by, decided_by_role,
                    decided_at
             FROM decision WHERE submission_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_decision(r)?)),
            None => Ok(None),
        }
    }
}
