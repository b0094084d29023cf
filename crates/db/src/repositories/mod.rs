use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use ipms_core::domain::actor::ActorRole;
use ipms_core::domain::decision::{Decision, DecisionId, DecisionOutcome};
use ipms_core::domain::project::{Project, ProjectId};
use ipms_core::domain::submission::{Submission, SubmissionId, SubmissionStatus};
use ipms_core::listing::{ReviewSummary, SubmissionFilters, SubmissionListRow};

pub mod decision;
pub mod memory;
pub mod project;
pub mod submission;

pub use decision::SqlDecisionRepository;
pub use memory::{InMemoryDecisionRepository, InMemoryProjectRepository, InMemorySubmissionRepository};
pub use project::SqlProjectRepository;
pub use submission::SqlSubmissionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// A decision before the store has assigned its ordering sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDecision {
    pub id: DecisionId,
    pub submission_id: SubmissionId,
    pub outcome: DecisionOutcome,
    pub remarks: Option<String>,
    pub decided_by: String,
    pub decided_by_role: ActorRole,
    pub decided_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;
    async fn save(&self, project: Project) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<Project>, RepositoryError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;

    async fn save(&self, submission: Submission) -> Result<(), RepositoryError>;

    /// Flip the denormalized status after a decision is appended.
    async fn update_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// One page of listing rows joined with project display fields and the
    /// latest decision, plus the unpaginated total for the filter scope.
    async fn list(
        &self,
        filters: &SubmissionFilters,
    ) -> Result<(Vec<SubmissionListRow>, u64), RepositoryError>;

    /// Every version in the resubmission chain containing `id`, newest
    /// version first.
    async fn version_chain(&self, id: &SubmissionId) -> Result<Vec<Submission>, RepositoryError>;

    /// Aggregate counts over the filter scope, ignoring pagination.
    async fn summarize(&self, filters: &SubmissionFilters) -> Result<ReviewSummary, RepositoryError>;
}

#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Append-only: the store assigns `seq` and the row is never updated.
    async fn append(&self, decision: NewDecision) -> Result<Decision, RepositoryError>;

    /// Full decision history for a submission, newest (highest seq) first.
    async fn list_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<Decision>, RepositoryError>;

    async fn latest_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Decision>, RepositoryError>;
}
