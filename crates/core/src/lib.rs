pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod listing;
pub mod workflow;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use domain::actor::{Actor, ActorRole};
pub use domain::decision::{Decision, DecisionId, DecisionOutcome};
pub use domain::project::{Project, ProjectId, ProjectPriority, ProjectStatus};
pub use domain::submission::{Submission, SubmissionCategory, SubmissionId, SubmissionStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use listing::{
    group_by_project, PageMeta, ProjectGroup, ReviewSummary, SortKey, SubmissionFilters,
    SubmissionListRow,
};
pub use workflow::engine::{ReviewRequest, WorkflowEngine, WorkflowError};
pub use workflow::policy::ReviewPolicy;
