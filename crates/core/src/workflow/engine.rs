use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::actor::{Actor, ActorRole};
use crate::domain::decision::DecisionOutcome;
use crate::domain::submission::{Submission, SubmissionCategory, SubmissionStatus};
use crate::workflow::policy::ReviewPolicy;

/// One reviewer decision request against a submission. `expected_status` is
/// the optional optimistic-concurrency token: when present, the review only
/// applies if the submission still holds that status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub outcome: DecisionOutcome,
    pub remarks: Option<String>,
    pub expected_status: Option<SubmissionStatus>,
}

impl ReviewRequest {
    pub fn new(outcome: DecisionOutcome, remarks: impl Into<String>) -> Self {
        let remarks = remarks.into();
        Self {
            outcome,
            remarks: (!remarks.trim().is_empty()).then(|| remarks.trim().to_string()),
            expected_status: None,
        }
    }

    pub fn expecting(mut self, status: SubmissionStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}

/// Accepted review: the transition to apply and the remarks to record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub from: SubmissionStatus,
    pub to: SubmissionStatus,
    pub outcome: DecisionOutcome,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("submission is {status:?} and accepts no further decisions")]
    TerminalState { status: SubmissionStatus },
    #[error("role `{role:?}` cannot review {category:?} submissions")]
    NotAuthorized { role: ActorRole, category: SubmissionCategory },
    #[error("outcome {outcome:?} is not allowed for {category:?} submissions")]
    OutcomeNotAllowed { category: SubmissionCategory, outcome: DecisionOutcome },
    #[error("remarks are required when the decision is {outcome:?}")]
    MissingRemarks { outcome: DecisionOutcome },
    #[error("submission status changed: expected {expected:?}, found {actual:?}")]
    StaleStatus { expected: SubmissionStatus, actual: SubmissionStatus },
}

/// The validation workflow state machine. Pure and synchronous: callers load
/// the submission, run `review`, then persist the decision row and the new
/// denormalized status.
#[derive(Clone, Debug, Default)]
pub struct WorkflowEngine {
    policy: ReviewPolicy,
}

impl WorkflowEngine {
    pub fn new(policy: ReviewPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReviewPolicy {
        &self.policy
    }

    pub fn initial_status(&self) -> SubmissionStatus {
        SubmissionStatus::Pending
    }

    pub fn review(
        &self,
        submission: &Submission,
        request: &ReviewRequest,
        actor: &Actor,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let current = submission.current_status;

        if current.is_terminal() {
            return Err(WorkflowError::TerminalState { status: current });
        }

        if !actor.role.can_review(&submission.category) {
            return Err(WorkflowError::NotAuthorized {
                role: actor.role,
                category: submission.category,
            });
        }

        if !self.policy.allows(&submission.category, &request.outcome) {
            return Err(WorkflowError::OutcomeNotAllowed {
                category: submission.category,
                outcome: request.outcome,
            });
        }

        let remarks =
            request.remarks.as_deref().map(str::trim).filter(|r| !r.is_empty()).map(String::from);
        if request.outcome.requires_remarks() && remarks.is_none() {
            return Err(WorkflowError::MissingRemarks { outcome: request.outcome });
        }

        if let Some(expected) = request.expected_status {
            if expected != current {
                return Err(WorkflowError::StaleStatus { expected, actual: current });
            }
        }

        Ok(ReviewOutcome {
            from: current,
            to: request.outcome.resulting_status(),
            outcome: request.outcome,
            remarks,
        })
    }

    pub fn review_with_audit<S>(
        &self,
        submission: &Submission,
        request: &ReviewRequest,
        actor: &Actor,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ReviewOutcome, WorkflowError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.review(submission, request, actor);
        match &result {
            // The engine has only accepted the decision here; persistence is
            // the caller's next step, so the event name must not claim a
            // recorded row.
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        Some(submission.id.clone()),
                        Some(submission.project_id.clone()),
                        audit.correlation_id.clone(),
                        "review.decision_accepted",
                        AuditCategory::Review,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("decision", outcome.outcome.as_str()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        Some(submission.id.clone()),
                        Some(submission.project_id.clone()),
                        audit.correlation_id.clone(),
                        "review.decision_blocked",
                        AuditCategory::Review,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}
