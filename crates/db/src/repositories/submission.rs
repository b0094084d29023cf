use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row};

use ipms_core::domain::actor::ActorRole;
use ipms_core::domain::decision::DecisionOutcome;
use ipms_core::domain::project::ProjectId;
use ipms_core::domain::submission::{
    Submission, SubmissionCategory, SubmissionId, SubmissionStatus,
};
use ipms_core::listing::{ReviewSummary, SortKey, SubmissionFilters, SubmissionListRow};

use super::project::{parse_decimal, parse_timestamp};
use super::{RepositoryError, SubmissionRepository};
use crate::DbPool;

pub struct SqlSubmissionRepository {
    pool: DbPool,
}

impl SqlSubmissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(e.to_string())
}

pub(crate) fn parse_role(raw: &str) -> Result<ActorRole, RepositoryError> {
    raw.parse().map_err(|_| RepositoryError::Decode(format!("unknown actor role `{raw}`")))
}

pub(crate) fn parse_submission_status(raw: &str) -> Result<SubmissionStatus, RepositoryError> {
    raw.parse().map_err(|_| RepositoryError::Decode(format!("unknown submission status `{raw}`")))
}

fn parse_category(raw: &str) -> Result<SubmissionCategory, RepositoryError> {
    raw.parse().map_err(|_| RepositoryError::Decode(format!("unknown submission category `{raw}`")))
}

fn row_to_submission(row: &sqlx::sqlite::SqliteRow) -> Result<Submission, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode)?;
    let project_id: String = row.try_get("project_id").map_err(decode)?;
    let category_str: String = row.try_get("category").map_err(decode)?;
    let title: String = row.try_get("title").map_err(decode)?;
    let description: String = row.try_get("description").map_err(decode)?;
    let amount_str: Option<String> = row.try_get("amount").map_err(decode)?;
    let progress_str: Option<String> = row.try_get("progress_pct").map_err(decode)?;
    let attachment_path: Option<String> = row.try_get("attachment_path").map_err(decode)?;
    let submitted_by: String = row.try_get("submitted_by").map_err(decode)?;
    let submitted_role_str: String = row.try_get("submitted_role").map_err(decode)?;
    let version_no: i64 = row.try_get("version_no").map_err(decode)?;
    let supersedes: Option<String> = row.try_get("supersedes").map_err(decode)?;
    let status_str: String = row.try_get("current_status").map_err(decode)?;
    let created_at_str: String = row.try_get("created_at").map_err(decode)?;
    let updated_at_str: String = row.try_get("updated_at").map_err(decode)?;

    Ok(Submission {
        id: SubmissionId(id),
        project_id: ProjectId(project_id),
        category: parse_category(&category_str)?,
        title,
        description,
        amount: amount_str.as_deref().map(|raw| parse_decimal("amount", raw)).transpose()?,
        progress_pct: progress_str
            .as_deref()
            .map(|raw| parse_decimal("progress_pct", raw))
            .transpose()?,
        attachment_path,
        submitted_by,
        submitted_role: parse_role(&submitted_role_str)?,
        version_no,
        supersedes: supersedes.map(SubmissionId),
        current_status: parse_submission_status(&status_str)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

fn row_to_list_row(row: &sqlx::sqlite::SqliteRow) -> Result<SubmissionListRow, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode)?;
    let project_id: String = row.try_get("project_id").map_err(decode)?;
    let project_code: String = row.try_get("project_code").map_err(decode)?;
    let project_name: String = row.try_get("project_name").map_err(decode)?;
    let project_sector: String = row.try_get("project_sector").map_err(decode)?;
    let category_str: String = row.try_get("category").map_err(decode)?;
    let title: String = row.try_get("title").map_err(decode)?;
    let amount_str: Option<String> = row.try_get("amount").map_err(decode)?;
    let progress_str: Option<String> = row.try_get("progress_pct").map_err(decode)?;
    let submitted_by: String = row.try_get("submitted_by").map_err(decode)?;
    let submitted_role_str: String = row.try_get("submitted_role").map_err(decode)?;
    let version_no: i64 = row.try_get("version_no").map_err(decode)?;
    let status_str: String = row.try_get("current_status").map_err(decode)?;
    let created_at_str: String = row.try_get("created_at").map_err(decode)?;
    let latest_outcome_str: Option<String> = row.try_get("latest_outcome").map_err(decode)?;
    let latest_validator: Option<String> = row.try_get("latest_validator").map_err(decode)?;
    let latest_remarks: Option<String> = row.try_get("latest_remarks").map_err(decode)?;
    let latest_decided_at_str: Option<String> =
        row.try_get("latest_decided_at").map_err(decode)?;

    let latest_outcome = latest_outcome_str
        .as_deref()
        .map(|raw| {
            raw.parse::<DecisionOutcome>()
                .map_err(|_| RepositoryError::Decode(format!("unknown decision outcome `{raw}`")))
        })
        .transpose()?;

    Ok(SubmissionListRow {
        id: SubmissionId(id),
        project_id: ProjectId(project_id),
        project_code,
        project_name,
        project_sector,
        category: parse_category(&category_str)?,
        title,
        amount: amount_str.as_deref().map(|raw| parse_decimal("amount", raw)).transpose()?,
        progress_pct: progress_str
            .as_deref()
            .map(|raw| parse_decimal("progress_pct", raw))
            .transpose()?,
        submitted_by,
        submitted_role: parse_role(&submitted_role_str)?,
        version_no,
        current_status: parse_submission_status(&status_str)?,
        submitted_at: parse_timestamp(&created_at_str),
        latest_outcome,
        latest_validator,
        latest_remarks,
        latest_decided_at: latest_decided_at_str.as_deref().map(parse_timestamp),
    })
}

/// Shared WHERE fragment for listing, counting, and summarizing, so the three
/// scopes can never drift apart.
fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filters: &SubmissionFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.to_ascii_lowercase());
        builder.push(" AND (LOWER(s.id) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(s.title) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(p.code) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(p.name) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(status) = &filters.status {
        builder.push(" AND s.current_status = ");
        builder.push_bind(status.as_str());
    }

    if let Some(category) = &filters.category {
        builder.push(" AND s.category = ");
        builder.push_bind(category.as_str());
    }

    if let Some(sector) = &filters.sector {
        builder.push(" AND LOWER(p.sector) = ");
        builder.push_bind(sector.to_ascii_lowercase());
    }

    if let Some(from) = &filters.submitted_from {
        builder.push(" AND s.created_at >= ");
        builder.push_bind(from.to_rfc3339());
    }

    if let Some(to) = &filters.submitted_to {
        builder.push(" AND s.created_at <= ");
        builder.push_bind(to.to_rfc3339());
    }
}

fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Newest => " ORDER BY s.created_at DESC, s.id DESC",
        SortKey::Oldest => " ORDER BY s.created_at ASC, s.id ASC",
        SortKey::Status => " ORDER BY s.current_status ASC, s.created_at DESC",
        SortKey::Project => " ORDER BY p.code ASC, s.created_at DESC",
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for SqlSubmissionRepository {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, project_id, category, title, description, amount, progress_pct,
                    attachment_path, submitted_by, submitted_role, version_no, supersedes,
                    current_status, created_at, updated_at
             FROM submission WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_submission(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, submission: Submission) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO submission
                (id, project_id, category, title, description, amount, progress_pct,
                 attachment_path, submitted_by, submitted_role, version_no, supersedes,
                 current_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 amount = excluded.amount,
                 progress_pct = excluded.progress_pct,
                 attachment_path = excluded.attachment_path,
                 current_status = excluded.current_status,
                 updated_at = excluded.updated_at",
        )
        .bind(&submission.id.0)
        .bind(&submission.project_id.0)
        .bind(submission.category.as_str())
        .bind(&submission.title)
        .bind(&submission.description)
        .bind(submission.amount.map(|a| a.to_string()))
        .bind(submission.progress_pct.map(|p| p.to_string()))
        .bind(&submission.attachment_path)
        .bind(&submission.submitted_by)
        .bind(submission.submitted_role.as_str())
        .bind(submission.version_no)
        .bind(submission.supersedes.as_ref().map(|id| id.0.clone()))
        .bind(submission.current_status.as_str())
        .bind(submission.created_at.to_rfc3339())
        .bind(submission.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE submission SET current_status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(updated_at.to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(
        &self,
        filters: &SubmissionFilters,
    ) -> Result<(Vec<SubmissionListRow>, u64), RepositoryError> {
        let mut builder = QueryBuilder::new(
            "SELECT s.id, s.project_id, p.code AS project_code, p.name AS project_name,
                    p.sector AS project_sector, s.category, s.title, s.amount, s.progress_pct,
                    s.submitted_by, s.submitted_role, s.version_no, s.current_status,
                    s.created_at,
                    d.outcome AS latest_outcome, d.decided_by AS latest_validator,
                    d.remarks AS latest_remarks, d.decided_at AS latest_decided_at
             FROM submission s
             JOIN project p ON p.id = s.project_id
             LEFT JOIN decision d ON d.submission_id = s.id
                  AND d.seq = (SELECT MAX(d2.seq) FROM decision d2
                               WHERE d2.submission_id = s.id)
             WHERE 1=1",
        );
        push_filters(&mut builder, filters);
        builder.push(order_clause(filters.sort));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(filters.page_size));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(filters.offset()));

        let rows = builder.build().fetch_all(&self.pool).await?;
        let data = rows.iter().map(row_to_list_row).collect::<Result<Vec<_>, _>>()?;

        let mut count_builder = QueryBuilder::new(
            "SELECT COUNT(*) AS total
             FROM submission s
             JOIN project p ON p.id = s.project_id
             WHERE 1=1",
        );
        push_filters(&mut count_builder, filters);
        let total: i64 =
            count_builder.build().fetch_one(&self.pool).await?.try_get("total").map_err(decode)?;

        Ok((data, total.max(0) as u64))
    }

    async fn version_chain(&self, id: &SubmissionId) -> Result<Vec<Submission>, RepositoryError> {
        let Some(submission) = self.find_by_id(id).await? else {
            return Ok(Vec::new());
        };
        let root = submission.chain_root().0.clone();

        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, project_id, category, title, description, amount, progress_pct,
                    attachment_path, submitted_by, submitted_role, version_no, supersedes,
                    current_status, created_at, updated_at
             FROM submission
             WHERE id = ? OR supersedes = ?
             ORDER BY version_no DESC",
        )
        .bind(&root)
        .bind(&root)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_submission).collect()
    }

    async fn summarize(
        &self,
        filters: &SubmissionFilters,
    ) -> Result<ReviewSummary, RepositoryError> {
        let mut builder = QueryBuilder::new(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN s.current_status IN ('approved', 'verified')
                                      THEN 1 ELSE 0 END), 0) AS approved,
                    COALESCE(SUM(CASE WHEN s.current_status IN ('pending', 'under_review')
                                      THEN 1 ELSE 0 END), 0) AS pending_review,
                    COALESCE(SUM(CASE WHEN s.current_status IN ('rejected', 'returned', 'suspended')
                                      THEN 1 ELSE 0 END), 0) AS rejected_returned
             FROM submission s
             JOIN project p ON p.id = s.project_id
             WHERE 1=1",
        );
        push_filters(&mut builder, filters);

        let row = builder.build().fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total").map_err(decode)?;
        let approved: i64 = row.try_get("approved").map_err(decode)?;
        let pending_review: i64 = row.try_get("pending_review").map_err(decode)?;
        let rejected_returned: i64 = row.try_get("rejected_returned").map_err(decode)?;

        Ok(ReviewSummary::new(
            total.max(0) as u64,
            approved.max(0) as u64,
            pending_review.max(0) as u64,
            rejected_returned.max(0) as u64,
        ))
    }
}
