use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::ActorRole;
use crate::domain::project::ProjectId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionCategory {
    Deliverable,
    ProgressUpdate,
    Expense,
    StatusChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    UnderReview,
    Verified,
    Approved,
    Rejected,
    Returned,
    Suspended,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown submission status `{0}`")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for SubmissionStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "under_review" => Ok(Self::UnderReview),
            "verified" => Ok(Self::Verified),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            "suspended" => Ok(Self::Suspended),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Verified => "verified",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
            Self::Suspended => "suspended",
        }
    }

    /// Approved submissions accept no further decisions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returned and rejected work may be resubmitted as a new version.
    pub fn allows_resubmission(&self) -> bool {
        matches!(self, Self::Returned | Self::Rejected)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown submission category `{0:?}`")]
pub struct ParseCategoryError(());

impl std::str::FromStr for SubmissionCategory {
    type Err = ParseCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deliverable" => Ok(Self::Deliverable),
            "progress_update" | "progress" => Ok(Self::ProgressUpdate),
            "expense" => Ok(Self::Expense),
            "status_change" => Ok(Self::StatusChange),
            _ => Err(ParseCategoryError(())),
        }
    }
}

impl SubmissionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deliverable => "deliverable",
            Self::ProgressUpdate => "progress_update",
            Self::Expense => "expense",
            Self::StatusChange => "status_change",
        }
    }
}

/// One unit of contractor/engineer work awaiting review: a deliverable, a
/// progress update, an expense entry, or a project status-change request.
///
/// `current_status` is denormalized: it always mirrors the outcome of the
/// latest decision recorded against this submission, or `Pending` when no
/// decision exists yet. Resubmissions form a version chain through
/// `supersedes`, with `version_no` increasing along the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub project_id: ProjectId,
    pub category: SubmissionCategory,
    pub title: String,
    pub description: String,
    pub amount: Option<Decimal>,
    pub progress_pct: Option<Decimal>,
    pub attachment_path: Option<String>,
    pub submitted_by: String,
    pub submitted_role: ActorRole,
    pub version_no: i64,
    pub supersedes: Option<SubmissionId>,
    pub current_status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Root id of the resubmission chain this version belongs to. Version 1
    /// is its own root; later versions keep pointing at the original.
    pub fn chain_root(&self) -> &SubmissionId {
        self.supersedes.as_ref().unwrap_or(&self.id)
    }

    /// Build the next version of a returned/rejected submission. The prior
    /// row is left untouched; review starts over from `Pending`.
    pub fn next_version(&self, id: SubmissionId, now: DateTime<Utc>) -> Submission {
        Submission {
            id,
            project_id: self.project_id.clone(),
            category: self.category,
            title: self.title.clone(),
            description: self.description.clone(),
            amount: self.amount,
            progress_pct: self.progress_pct,
            attachment_path: self.attachment_path.clone(),
            submitted_by: self.submitted_by.clone(),
            submitted_role: self.submitted_role,
            version_no: self.version_no + 1,
            supersedes: Some(self.chain_root().clone()),
            current_status: SubmissionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Submission, SubmissionCategory, SubmissionId, SubmissionStatus};
    use crate::domain::actor::ActorRole;
    use crate::domain::project::ProjectId;

    fn submission(status: SubmissionStatus) -> Submission {
        let now = Utc::now();
        Submission {
            id: SubmissionId("SUB-001".to_string()),
            project_id: ProjectId("PRJ-001".to_string()),
            category: SubmissionCategory::Deliverable,
            title: "Drainage canal lining".to_string(),
            description: "Phase 1 lining works".to_string(),
            amount: None,
            progress_pct: None,
            attachment_path: None,
            submitted_by: "c-001".to_string(),
            submitted_role: ActorRole::Contractor,
            version_no: 1,
            supersedes: None,
            current_status: status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn approved_is_the_only_terminal_status() {
        assert!(SubmissionStatus::Approved.is_terminal());
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Verified,
            SubmissionStatus::Rejected,
            SubmissionStatus::Returned,
            SubmissionStatus::Suspended,
        ] {
            assert!(!status.is_terminal(), "{status:?} should accept further decisions");
        }
    }

    #[test]
    fn next_version_links_back_to_chain_root() {
        let first = submission(SubmissionStatus::Returned);
        let second =
            first.next_version(SubmissionId("SUB-002".to_string()), Utc::now());
        let third = second.next_version(SubmissionId("SUB-003".to_string()), Utc::now());

        assert_eq!(second.version_no, 2);
        assert_eq!(second.supersedes, Some(first.id.clone()));
        assert_eq!(second.current_status, SubmissionStatus::Pending);
        assert_eq!(third.version_no, 3);
        assert_eq!(third.supersedes, Some(first.id), "chain root must not drift");
    }

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Verified,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
            SubmissionStatus::Returned,
            SubmissionStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<SubmissionStatus>().unwrap(), status);
        }
    }
}
