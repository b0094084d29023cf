//! Validation workflow routes.
//!
//! - `GET  /api/v1/submissions`                 — filtered, paginated listing
//! - `GET  /api/v1/submissions/summary`         — aggregate counts for the scope
//! - `GET  /api/v1/submissions/{id}`            — detail with version chain and decision log
//! - `POST /api/v1/submissions/{id}/decision`   — record a reviewer decision
//! - `POST /api/v1/submissions/{id}/resubmit`   — file a corrected version
//!
//! Reviewer identity rides on `X-Actor-Id` / `X-Actor-Role` (optionally
//! `X-Actor-Name`); authentication itself lives upstream.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ipms_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome};
use ipms_core::domain::actor::Actor;
use ipms_core::domain::decision::{Decision, DecisionId, DecisionOutcome};
use ipms_core::domain::project::Project;
use ipms_core::domain::submission::{Submission, SubmissionId};
use ipms_core::errors::{ApplicationError, DomainError, InterfaceError};
use ipms_core::listing::{
    group_by_project, PageMeta, ProjectGroup, ReviewSummary, SubmissionFilters, SubmissionListRow,
};
use ipms_core::workflow::engine::ReviewRequest;

use crate::bootstrap::Application;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub sector: Option<String>,
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SubmissionListRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ProjectGroup>>,
    pub meta: PageMeta,
    /// Aggregate counts for the same filter scope, so one call feeds both the
    /// table and the dashboard tiles.
    pub summary: ReviewSummary,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub success: bool,
    pub item: Submission,
    pub project: Project,
    /// Every version in the resubmission chain, newest first.
    pub versions: Vec<Submission>,
    /// Full decision log, newest first.
    pub logs: Vec<Decision>,
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub outcome: String,
    pub remarks: Option<String>,
    pub expected_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecideResponse {
    pub success: bool,
    pub message: String,
    pub submission: Submission,
    pub decision: Decision,
    pub summary: ReviewSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResubmitRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub progress_pct: Option<Decimal>,
    pub attachment_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission: Submission,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: ReviewSummary,
}

#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub message: String,
    pub correlation_id: String,
}

pub type ApiError = (StatusCode, Json<ApiFailure>);

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(app: Application) -> Router {
    Router::new()
        .route("/api/v1/submissions", get(list_submissions))
        .route("/api/v1/submissions/summary", get(summarize_submissions))
        .route("/api/v1/submissions/{id}", get(get_submission))
        .route("/api/v1/submissions/{id}/decision", post(decide_submission))
        .route("/api/v1/submissions/{id}/resubmit", post(resubmit_submission))
        .with_state(app)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn to_api(error: InterfaceError) -> ApiError {
    let (status, correlation_id) = match &error {
        InterfaceError::BadRequest { correlation_id, .. } => {
            (StatusCode::BAD_REQUEST, correlation_id.clone())
        }
        InterfaceError::Forbidden { correlation_id, .. } => {
            (StatusCode::FORBIDDEN, correlation_id.clone())
        }
        InterfaceError::NotFound { correlation_id, .. } => {
            (StatusCode::NOT_FOUND, correlation_id.clone())
        }
        InterfaceError::Conflict { correlation_id, .. } => {
            (StatusCode::CONFLICT, correlation_id.clone())
        }
        InterfaceError::ServiceUnavailable { correlation_id, .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
        }
        InterfaceError::Internal { correlation_id, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
        }
    };
    (
        status,
        Json(ApiFailure { success: false, message: error.user_message(), correlation_id }),
    )
}

fn bad_request(message: impl Into<String>, correlation_id: &str) -> ApiError {
    to_api(InterfaceError::BadRequest {
        message: message.into(),
        correlation_id: correlation_id.to_string(),
    })
}

fn persistence(error: ipms_db::repositories::RepositoryError, correlation_id: &str) -> ApiError {
    to_api(ApplicationError::Persistence(error.to_string()).into_interface(correlation_id))
}

fn not_found(entity: &'static str, id: &str, correlation_id: &str) -> ApiError {
    to_api(ApplicationError::NotFound { entity, id: id.to_string() }.into_interface(correlation_id))
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn actor_from_headers(headers: &HeaderMap, correlation_id: &str) -> Result<Actor, ApiError> {
    let id = header(headers, "x-actor-id")
        .ok_or_else(|| bad_request("missing `X-Actor-Id` header", correlation_id))?;
    let role = header(headers, "x-actor-role")
        .ok_or_else(|| bad_request("missing `X-Actor-Role` header", correlation_id))?
        .parse()
        .map_err(|error: ipms_core::domain::actor::ParseActorRoleError| {
            bad_request(error.to_string(), correlation_id)
        })?;
    let name = header(headers, "x-actor-name").unwrap_or_else(|| id.clone());
    Ok(Actor { id, name, role })
}

fn filters_from_query(query: &ListQuery, correlation_id: &str) -> Result<SubmissionFilters, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|error: ipms_core::domain::submission::ParseStatusError| {
            bad_request(error.to_string(), correlation_id)
        })?;
    let category = query
        .category
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|error: ipms_core::domain::submission::ParseCategoryError| {
            bad_request(error.to_string(), correlation_id)
        })?;
    let sort = query
        .sort
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|error: String| bad_request(error, correlation_id))?
        .unwrap_or_default();

    Ok(SubmissionFilters {
        search: query.search.clone(),
        status,
        category,
        sector: query.sector.clone(),
        submitted_from: query.submitted_from,
        submitted_to: query.submitted_to,
        sort,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(0),
    }
    .normalized())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn list_submissions(
    State(app): State<Application>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let filters = filters_from_query(&query, &correlation_id)?;

    let (rows, total) =
        app.submissions.list(&filters).await.map_err(|e| persistence(e, &correlation_id))?;
    let summary =
        app.submissions.summarize(&filters).await.map_err(|e| persistence(e, &correlation_id))?;
    let meta = PageMeta::new(filters.page, filters.page_size, total);

    let grouped = query.group.as_deref() == Some("project");
    let (items, groups) =
        if grouped { (None, Some(group_by_project(rows))) } else { (Some(rows), None) };

    Ok(Json(ListResponse { success: true, items, groups, meta, summary }))
}

pub async fn summarize_submissions(
    State(app): State<Application>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let filters = filters_from_query(&query, &correlation_id)?;

    let summary =
        app.submissions.summarize(&filters).await.map_err(|e| persistence(e, &correlation_id))?;

    Ok(Json(SummaryResponse { success: true, summary }))
}

pub async fn get_submission(
    State(app): State<Application>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let submission_id = SubmissionId(id.clone());

    let submission = app
        .submissions
        .find_by_id(&submission_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?
        .ok_or_else(|| not_found("submission", &id, &correlation_id))?;
    let project = app
        .projects
        .find_by_id(&submission.project_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?
        .ok_or_else(|| not_found("project", &submission.project_id.0, &correlation_id))?;
    let versions = app
        .submissions
        .version_chain(&submission_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?;
    let logs = app
        .decisions
        .list_for_submission(&submission_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?;

    Ok(Json(DetailResponse { success: true, item: submission, project, versions, logs }))
}

pub async fn decide_submission(
    State(app): State<Application>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DecideRequest>,
) -> Result<Json<DecideResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let actor = actor_from_headers(&headers, &correlation_id)?;
    let submission_id = SubmissionId(id.clone());

    let outcome: DecisionOutcome = body
        .outcome
        .parse()
        .map_err(|error: ipms_core::domain::decision::ParseOutcomeError| {
            bad_request(error.to_string(), &correlation_id)
        })?;
    let mut request = ReviewRequest::new(outcome, body.remarks.unwrap_or_default());
    if let Some(expected) = body.expected_status.as_deref() {
        let expected = expected.parse().map_err(
            |error: ipms_core::domain::submission::ParseStatusError| {
                bad_request(error.to_string(), &correlation_id)
            },
        )?;
        request = request.expecting(expected);
    }

    let submission = app
        .submissions
        .find_by_id(&submission_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?
        .ok_or_else(|| not_found("submission", &id, &correlation_id))?;

    let audit_context = AuditContext::new(
        Some(submission.id.clone()),
        Some(submission.project_id.clone()),
        correlation_id.clone(),
        actor.id.clone(),
    );
    let review = app
        .engine
        .review_with_audit(&submission, &request, &actor, app.audit.as_ref(), &audit_context)
        .map_err(|error| {
            to_api(
                ApplicationError::from(DomainError::from(error)).into_interface(&correlation_id),
            )
        })?;

    let decided_at = Utc::now();
    let decision = app
        .decisions
        .append(ipms_db::repositories::NewDecision {
            id: DecisionId(Uuid::new_v4().to_string()),
            submission_id: submission.id.clone(),
            outcome: review.outcome,
            remarks: review.remarks.clone(),
            decided_by: actor.id.clone(),
            decided_by_role: actor.role,
            decided_at,
        })
        .await
        .map_err(|e| persistence(e, &correlation_id))?;
    app.submissions
        .update_status(&submission.id, review.to, decided_at)
        .await
        .map_err(|e| persistence(e, &correlation_id))?;

    info!(
        event_name = "review.decision_applied",
        correlation_id = %correlation_id,
        submission_id = %submission.id.0,
        from = review.from.as_str(),
        to = review.to.as_str(),
        "decision recorded and status updated"
    );

    let summary = app
        .submissions
        .summarize(&SubmissionFilters::default().normalized())
        .await
        .map_err(|e| persistence(e, &correlation_id))?;

    let mut submission = submission;
    submission.current_status = review.to;
    submission.updated_at = decided_at;

    Ok(Json(DecideResponse {
        success: true,
        message: format!("submission marked {}", review.to.as_str()),
        submission,
        decision,
        summary,
    }))
}

pub async fn resubmit_submission(
    State(app): State<Application>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ResubmitRequest>,
) -> Result<Json<ResubmitResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let actor = actor_from_headers(&headers, &correlation_id)?;
    let submission_id = SubmissionId(id.clone());

    let submission = app
        .submissions
        .find_by_id(&submission_id)
        .await
        .map_err(|e| persistence(e, &correlation_id))?
        .ok_or_else(|| not_found("submission", &id, &correlation_id))?;

    if !submission.current_status.allows_resubmission() {
        return Err(bad_request(
            format!(
                "submission is {} and cannot be resubmitted",
                submission.current_status.as_str()
            ),
            &correlation_id,
        ));
    }
    if actor.role != ipms_core::domain::actor::ActorRole::Contractor {
        return Err(to_api(InterfaceError::Forbidden {
            message: "only contractors may resubmit".to_string(),
            correlation_id: correlation_id.clone(),
        }));
    }

    let mut next = submission.next_version(SubmissionId(Uuid::new_v4().to_string()), Utc::now());
    next.submitted_by = actor.id.clone();
    if let Some(title) = body.title {
        next.title = title;
    }
    if let Some(description) = body.description {
        next.description = description;
    }
    if let Some(amount) = body.amount {
        next.amount = Some(amount);
    }
    if let Some(progress_pct) = body.progress_pct {
        next.progress_pct = Some(progress_pct);
    }
    if let Some(attachment_path) = body.attachment_path {
        next.attachment_path = Some(attachment_path);
    }

    app.submissions.save(next.clone()).await.map_err(|e| persistence(e, &correlation_id))?;
    app.audit.emit(
        AuditEvent::new(
            Some(next.id.clone()),
            Some(next.project_id.clone()),
            correlation_id.clone(),
            "resubmission.version_created",
            AuditCategory::Resubmission,
            actor.id.clone(),
            AuditOutcome::Success,
        )
        .with_metadata("supersedes", submission.id.0.as_str())
        .with_metadata("version_no", next.version_no.to_string()),
    );

    Ok(Json(ResubmitResponse {
        success: true,
        message: format!("version {} filed for review", next.version_no),
        submission: next,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::Json;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use ipms_core::audit::TracingAuditSink;
    use ipms_core::config::AppConfig;
    use ipms_core::domain::actor::ActorRole;
    use ipms_core::domain::decision::DecisionOutcome;
    use ipms_core::domain::project::{Project, ProjectId, ProjectPriority, ProjectStatus};
    use ipms_core::domain::submission::{
        Submission, SubmissionCategory, SubmissionId, SubmissionStatus,
    };
    use ipms_core::workflow::policy::ReviewPolicy;
    use ipms_core::WorkflowEngine;
    use ipms_db::repositories::{
        ProjectRepository, SqlDecisionRepository, SqlProjectRepository, SqlSubmissionRepository,
        SubmissionRepository,
    };
    use ipms_db::{connect_with_settings, migrations};

    use super::{
        decide_submission, get_submission, list_submissions, resubmit_submission,
        summarize_submissions, DecideRequest, ListQuery, ResubmitRequest,
    };
    use crate::bootstrap::Application;

    async fn test_app() -> Application {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        Application {
            config: AppConfig::default(),
            engine: WorkflowEngine::new(ReviewPolicy::default()),
            projects: Arc::new(SqlProjectRepository::new(pool.clone())),
            submissions: Arc::new(SqlSubmissionRepository::new(pool.clone())),
            decisions: Arc::new(SqlDecisionRepository::new(pool.clone())),
            audit: Arc::new(TracingAuditSink),
            db_pool: pool,
        }
    }

    async fn seed(app: &Application, submission_id: &str, status: SubmissionStatus) {
        let now = Utc::now();
        app.projects
            .save(Project {
                id: ProjectId("PRJ-1".to_string()),
                code: "FMR-001".to_string(),
                name: "Farm-to-market road".to_string(),
                location: "Barangay San Isidro".to_string(),
                sector: "roads".to_string(),
                budget: Decimal::new(2_500_000_00, 2),
                status: ProjectStatus::Ongoing,
                priority: ProjectPriority::High,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed project");
        app.submissions
            .save(Submission {
                id: SubmissionId(submission_id.to_string()),
                project_id: ProjectId("PRJ-1".to_string()),
                category: SubmissionCategory::Deliverable,
                title: "Base course laying".to_string(),
                description: "Km 3 to Km 5".to_string(),
                amount: None,
                progress_pct: Some(Decimal::new(4500, 2)),
                attachment_path: None,
                submitted_by: "c-9".to_string(),
                submitted_role: ActorRole::Contractor,
                version_no: 1,
                supersedes: None,
                current_status: status,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed submission");
    }

    fn headers(id: &str, role: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-actor-id", id.parse().expect("header value"));
        headers.insert("x-actor-role", role.parse().expect("header value"));
        headers
    }

    fn decide(outcome: &str, remarks: &str) -> DecideRequest {
        DecideRequest {
            outcome: outcome.to_string(),
            remarks: Some(remarks.to_string()),
            expected_status: None,
        }
    }

    #[tokio::test]
    async fn rejection_without_remarks_leaves_submission_untouched() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let (status, Json(failure)) = decide_submission(
            State(app.clone()),
            Path("SUB-1".to_string()),
            headers("eng-4", "engineer"),
            Json(decide("rejected", "")),
        )
        .await
        .expect_err("empty remarks must fail");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!failure.success);
        assert!(failure.message.contains("remarks"));

        let found = app
            .submissions
            .find_by_id(&SubmissionId("SUB-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(found.current_status, SubmissionStatus::Pending);

        let Json(detail) =
            get_submission(State(app), Path("SUB-1".to_string())).await.expect("detail");
        assert!(detail.logs.is_empty(), "blocked decisions leave no log entries");
    }

    #[tokio::test]
    async fn reject_then_approve_builds_a_two_entry_log() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let Json(rejected) = decide_submission(
            State(app.clone()),
            Path("SUB-1".to_string()),
            headers("eng-4", "engineer"),
            Json(decide("rejected", "missing permit")),
        )
        .await
        .expect("rejection with remarks succeeds");
        assert_eq!(rejected.submission.current_status, SubmissionStatus::Rejected);
        assert_eq!(rejected.decision.remarks.as_deref(), Some("missing permit"));

        let Json(approved) = decide_submission(
            State(app.clone()),
            Path("SUB-1".to_string()),
            headers("eng-4", "engineer"),
            Json(decide("approved", "")),
        )
        .await
        .expect("rejected is not terminal");
        assert_eq!(approved.submission.current_status, SubmissionStatus::Approved);

        let Json(detail) =
            get_submission(State(app), Path("SUB-1".to_string())).await.expect("detail");
        assert_eq!(detail.logs.len(), 2);
        assert_eq!(detail.logs[0].outcome, DecisionOutcome::Approved);
        assert_eq!(detail.logs[1].outcome, DecisionOutcome::Rejected);
    }

    #[tokio::test]
    async fn contractor_cannot_decide() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let (status, Json(failure)) = decide_submission(
            State(app),
            Path("SUB-1".to_string()),
            headers("c-9", "contractor"),
            Json(decide("approved", "")),
        )
        .await
        .expect_err("contractors lack reviewer capability");

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!failure.success);
    }

    #[tokio::test]
    async fn stale_expected_status_returns_conflict() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Rejected).await;

        let (status, _) = decide_submission(
            State(app),
            Path("SUB-1".to_string()),
            headers("eng-4", "engineer"),
            Json(DecideRequest {
                outcome: "approved".to_string(),
                remarks: None,
                expected_status: Some("pending".to_string()),
            }),
        )
        .await
        .expect_err("token is stale");

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_submission_is_not_found() {
        let app = test_app().await;

        let (status, Json(failure)) = decide_submission(
            State(app),
            Path("SUB-404".to_string()),
            headers("eng-4", "engineer"),
            Json(decide("approved", "")),
        )
        .await
        .expect_err("missing submission");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(failure.message.contains("SUB-404"));
    }

    #[tokio::test]
    async fn missing_actor_headers_is_a_bad_request() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let (status, _) = decide_submission(
            State(app),
            Path("SUB-1".to_string()),
            HeaderMap::new(),
            Json(decide("approved", "")),
        )
        .await
        .expect_err("actor headers are required");

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_supports_project_grouping() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let Json(flat) = list_submissions(State(app.clone()), Query(ListQuery::default()))
            .await
            .expect("flat listing");
        assert!(flat.items.is_some());
        assert!(flat.groups.is_none());
        assert_eq!(flat.meta.total, 1);

        let Json(grouped) = list_submissions(
            State(app),
            Query(ListQuery { group: Some("project".to_string()), ..ListQuery::default() }),
        )
        .await
        .expect("grouped listing");
        let groups = grouped.groups.expect("groups present");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].project_code, "FMR-001");
        assert_eq!(grouped.summary.total, 1, "grouped responses carry the scope summary too");
    }

    #[tokio::test]
    async fn listing_carries_summary_for_its_filter_scope() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Approved).await;
        seed(&app, "SUB-2", SubmissionStatus::Pending).await;

        let Json(all) = list_submissions(State(app.clone()), Query(ListQuery::default()))
            .await
            .expect("unfiltered listing");
        assert_eq!(all.summary.total, 2);
        assert_eq!(all.summary.approved, 1);
        assert_eq!(all.summary.pending_review, 1);
        assert_eq!(all.summary.overall_percent, Decimal::new(5000, 2));

        let Json(pending) = list_submissions(
            State(app),
            Query(ListQuery { status: Some("pending".to_string()), ..ListQuery::default() }),
        )
        .await
        .expect("filtered listing");
        assert_eq!(pending.meta.total, 1);
        assert_eq!(pending.summary.total, 1, "summary is scoped by the same filters as the rows");
        assert_eq!(pending.summary.approved, 0);
    }

    #[tokio::test]
    async fn listing_rejects_unknown_status_filter() {
        let app = test_app().await;

        let (status, _) = list_submissions(
            State(app),
            Query(ListQuery { status: Some("bogus".to_string()), ..ListQuery::default() }),
        )
        .await
        .expect_err("unknown status filter");

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_reports_bucket_counts_and_percentage() {
        let app = test_app().await;
        seed(&app, "SUB-0", SubmissionStatus::Pending).await;
        for (i, status) in [
            SubmissionStatus::Approved,
            SubmissionStatus::Approved,
            SubmissionStatus::Approved,
            SubmissionStatus::Verified,
            SubmissionStatus::Pending,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Rejected,
            SubmissionStatus::Returned,
            SubmissionStatus::Suspended,
        ]
        .into_iter()
        .enumerate()
        {
            seed(&app, &format!("SUB-{}", i + 1), status).await;
        }

        let Json(response) = summarize_submissions(State(app), Query(ListQuery::default()))
            .await
            .expect("summary");

        assert_eq!(response.summary.total, 10);
        assert_eq!(response.summary.approved, 4);
        assert_eq!(response.summary.pending_review, 3);
        assert_eq!(response.summary.rejected_returned, 3);
        assert_eq!(response.summary.overall_percent, Decimal::new(4000, 2));
    }

    #[tokio::test]
    async fn returned_submission_can_be_resubmitted_as_a_new_version() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Returned).await;

        let Json(response) = resubmit_submission(
            State(app.clone()),
            Path("SUB-1".to_string()),
            headers("c-9", "contractor"),
            Json(ResubmitRequest {
                description: Some("Km 3 to Km 5, compaction results attached".to_string()),
                attachment_path: Some("uploads/compaction.pdf".to_string()),
                ..ResubmitRequest::default()
            }),
        )
        .await
        .expect("resubmission");

        assert_eq!(response.submission.version_no, 2);
        assert_eq!(response.submission.current_status, SubmissionStatus::Pending);
        assert_eq!(response.submission.supersedes, Some(SubmissionId("SUB-1".to_string())));
        assert_eq!(
            response.submission.attachment_path.as_deref(),
            Some("uploads/compaction.pdf")
        );

        let Json(detail) = get_submission(State(app), Path(response.submission.id.0.clone()))
            .await
            .expect("detail");
        assert_eq!(detail.versions.len(), 2);
        assert_eq!(detail.versions[0].id, response.submission.id);
    }

    #[tokio::test]
    async fn pending_submission_cannot_be_resubmitted() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Pending).await;

        let (status, _) = resubmit_submission(
            State(app),
            Path("SUB-1".to_string()),
            headers("c-9", "contractor"),
            Json(ResubmitRequest::default()),
        )
        .await
        .expect_err("pending has nothing to correct");

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_contractors_may_resubmit() {
        let app = test_app().await;
        seed(&app, "SUB-1", SubmissionStatus::Returned).await;

        let (status, _) = resubmit_submission(
            State(app),
            Path("SUB-1".to_string()),
            headers("eng-4", "engineer"),
            Json(ResubmitRequest::default()),
        )
        .await
        .expect_err("reviewers do not file corrections");

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
