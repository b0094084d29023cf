use thiserror::Error;

use crate::workflow::engine::WorkflowError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// Boundary-facing error shape. The raw message stays server-side; callers
/// see only `user_message` plus the correlation id for support lookups.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. } => message.clone(),
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly.".to_string()
            }
            Self::Internal { .. } => "An unexpected internal error occurred.".to_string(),
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = "unassigned".to_string();
        match value {
            ApplicationError::Domain(DomainError::Workflow(error)) => match &error {
                WorkflowError::NotAuthorized { .. } => {
                    Self::Forbidden { message: error.to_string(), correlation_id: unassigned }
                }
                WorkflowError::StaleStatus { .. } => {
                    Self::Conflict { message: error.to_string(), correlation_id: unassigned }
                }
                WorkflowError::TerminalState { .. }
                | WorkflowError::OutcomeNotAllowed { .. }
                | WorkflowError::MissingRemarks { .. } => {
                    Self::BadRequest { message: error.to_string(), correlation_id: unassigned }
                }
            },
            ApplicationError::Domain(error @ DomainError::InvariantViolation(_)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::NotFound { entity, id } => Self::NotFound {
                message: format!("{entity} `{id}` not found"),
                correlation_id: unassigned,
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError, InterfaceError};
    use crate::domain::decision::DecisionOutcome;
    use crate::workflow::engine::WorkflowError;

    #[test]
    fn missing_remarks_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::from(WorkflowError::MissingRemarks {
            outcome: DecisionOutcome::Rejected,
        }))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, .. } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn not_found_keeps_entity_and_id_in_message() {
        let interface = ApplicationError::NotFound { entity: "submission", id: "SUB-9".to_string() }
            .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.user_message(), "submission `SUB-9` not found");
    }

    #[test]
    fn persistence_error_hides_detail_from_callers() {
        let interface = ApplicationError::Persistence("database lock timeout".to_string())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert!(!interface.user_message().contains("lock timeout"));
    }

    #[test]
    fn stale_status_maps_to_conflict() {
        use crate::domain::submission::SubmissionStatus;

        let interface = ApplicationError::from(DomainError::from(WorkflowError::StaleStatus {
            expected: SubmissionStatus::Pending,
            actual: SubmissionStatus::Rejected,
        }))
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
    }
}
