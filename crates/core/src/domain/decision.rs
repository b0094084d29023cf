use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::ActorRole;
use crate::domain::submission::{SubmissionId, SubmissionStatus};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
    Returned,
    Verified,
    Suspended,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown decision outcome `{0}`")]
pub struct ParseOutcomeError(pub String);

impl std::str::FromStr for DecisionOutcome {
    type Err = ParseOutcomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            "verified" => Ok(Self::Verified),
            "suspended" => Ok(Self::Suspended),
            other => Err(ParseOutcomeError(other.to_string())),
        }
    }
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
            Self::Verified => "verified",
            Self::Suspended => "suspended",
        }
    }

    /// Negative and returning outcomes must carry reviewer remarks so the
    /// submitter knows what to fix.
    pub fn requires_remarks(&self) -> bool {
        matches!(self, Self::Rejected | Self::Returned | Self::Suspended)
    }

    /// Status the submission lands in once this outcome is recorded.
    pub fn resulting_status(&self) -> SubmissionStatus {
        match self {
            Self::Approved => SubmissionStatus::Approved,
            Self::Rejected => SubmissionStatus::Rejected,
            Self::Returned => SubmissionStatus::Returned,
            Self::Verified => SubmissionStatus::Verified,
            Self::Suspended => SubmissionStatus::Suspended,
        }
    }
}

/// One immutable reviewer action against a submission. Rows are append-only;
/// `seq` is assigned by the store as a strictly increasing sequence, and the
/// decision with the highest `seq` defines the submission's current status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub submission_id: SubmissionId,
    pub outcome: DecisionOutcome,
    pub remarks: Option<String>,
    pub decided_by: String,
    pub decided_by_role: ActorRole,
    pub seq: i64,
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::DecisionOutcome;
    use crate::domain::submission::SubmissionStatus;

    #[test]
    fn negative_outcomes_require_remarks() {
        assert!(DecisionOutcome::Rejected.requires_remarks());
        assert!(DecisionOutcome::Returned.requires_remarks());
        assert!(DecisionOutcome::Suspended.requires_remarks());
        assert!(!DecisionOutcome::Approved.requires_remarks());
        assert!(!DecisionOutcome::Verified.requires_remarks());
    }

    #[test]
    fn outcome_maps_onto_matching_status() {
        assert_eq!(DecisionOutcome::Approved.resulting_status(), SubmissionStatus::Approved);
        assert_eq!(DecisionOutcome::Returned.resulting_status(), SubmissionStatus::Returned);
        assert_eq!(DecisionOutcome::Verified.resulting_status(), SubmissionStatus::Verified);
    }
}
