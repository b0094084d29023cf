//! In-memory repositories backed by a single shared store, for tests and for
//! wiring services without a database file.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use ipms_core::domain::decision::Decision;
use ipms_core::domain::project::{Project, ProjectId};
use ipms_core::domain::submission::{Submission, SubmissionId, SubmissionStatus};
use ipms_core::listing::{ReviewSummary, SortKey, SubmissionFilters, SubmissionListRow};

use super::{
    DecisionRepository, NewDecision, ProjectRepository, RepositoryError, SubmissionRepository,
};

#[derive(Default)]
struct StoreState {
    projects: BTreeMap<String, Project>,
    submissions: BTreeMap<String, Submission>,
    decisions: Vec<Decision>,
    next_seq: i64,
}

/// Shared backing store. Clone it to hand the same state to each repository.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProjectRepository {
    store: InMemoryStore,
}

impl InMemoryProjectRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.store.with_state(|state| state.projects.get(&id.0).cloned()))
    }

    async fn save(&self, project: Project) -> Result<(), RepositoryError> {
        self.store.with_state(|state| {
            state.projects.insert(project.id.0.clone(), project);
        });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut projects: Vec<Project> =
            self.store.with_state(|state| state.projects.values().cloned().collect());
        projects.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(projects)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySubmissionRepository {
    store: InMemoryStore,
}

impl InMemorySubmissionRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

fn matches(state: &StoreState, submission: &Submission, filters: &SubmissionFilters) -> bool {
    let project = state.projects.get(&submission.project_id.0);

    if let Some(search) = &filters.search {
        let needle = search.to_ascii_lowercase();
        let haystacks = [
            submission.id.0.to_ascii_lowercase(),
            submission.title.to_ascii_lowercase(),
            project.map(|p| p.code.to_ascii_lowercase()).unwrap_or_default(),
            project.map(|p| p.name.to_ascii_lowercase()).unwrap_or_default(),
        ];
        if !haystacks.iter().any(|h| h.contains(&needle)) {
            return false;
        }
    }
    if let Some(status) = &filters.status {
        if submission.current_status != *status {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if submission.category != *category {
            return false;
        }
    }
    if let Some(sector) = &filters.sector {
        let project_sector = project.map(|p| p.sector.to_ascii_lowercase()).unwrap_or_default();
        if project_sector != sector.to_ascii_lowercase() {
            return false;
        }
    }
    if let Some(from) = &filters.submitted_from {
        if submission.created_at < *from {
            return false;
        }
    }
    if let Some(to) = &filters.submitted_to {
        if submission.created_at > *to {
            return false;
        }
    }
    true
}

fn to_list_row(state: &StoreState, submission: &Submission) -> SubmissionListRow {
    let project = state.projects.get(&submission.project_id.0);
    let latest = state
        .decisions
        .iter()
        .filter(|d| d.submission_id == submission.id)
        .max_by_key(|d| d.seq);

    SubmissionListRow {
        id: submission.id.clone(),
        project_id: submission.project_id.clone(),
        project_code: project.map(|p| p.code.clone()).unwrap_or_default(),
        project_name: project.map(|p| p.name.clone()).unwrap_or_default(),
        project_sector: project.map(|p| p.sector.clone()).unwrap_or_default(),
        category: submission.category,
        title: submission.title.clone(),
        amount: submission.amount,
        progress_pct: submission.progress_pct,
        submitted_by: submission.submitted_by.clone(),
        submitted_role: submission.submitted_role,
        version_no: submission.version_no,
        current_status: submission.current_status,
        submitted_at: submission.created_at,
        latest_outcome: latest.map(|d| d.outcome),
        latest_validator: latest.map(|d| d.decided_by.clone()),
        latest_remarks: latest.and_then(|d| d.remarks.clone()),
        latest_decided_at: latest.map(|d| d.decided_at),
    }
}

fn sort_rows(rows: &mut [SubmissionListRow], sort: SortKey) {
    match sort {
        SortKey::Newest => rows.sort_by(|a, b| {
            b.submitted_at.cmp(&a.submitted_at).then_with(|| b.id.0.cmp(&a.id.0))
        }),
        SortKey::Oldest => rows.sort_by(|a, b| {
            a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.0.cmp(&b.id.0))
        }),
        SortKey::Status => rows.sort_by(|a, b| {
            a.current_status
                .as_str()
                .cmp(b.current_status.as_str())
                .then_with(|| b.submitted_at.cmp(&a.submitted_at))
        }),
        SortKey::Project => rows.sort_by(|a, b| {
            a.project_code.cmp(&b.project_code).then_with(|| b.submitted_at.cmp(&a.submitted_at))
        }),
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Ok(self.store.with_state(|state| state.submissions.get(&id.0).cloned()))
    }

    async fn save(&self, submission: Submission) -> Result<(), RepositoryError> {
        self.store.with_state(|state| {
            state.submissions.insert(submission.id.0.clone(), submission);
        });
        Ok(())
    }

    async fn update_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.store.with_state(|state| {
            if let Some(submission) = state.submissions.get_mut(&id.0) {
                submission.current_status = status;
                submission.updated_at = updated_at;
            }
        });
        Ok(())
    }

    async fn list(
        &self,
        filters: &SubmissionFilters,
    ) -> Result<(Vec<SubmissionListRow>, u64), RepositoryError> {
        Ok(self.store.with_state(|state| {
            let mut rows: Vec<SubmissionListRow> = state
                .submissions
                .values()
                .filter(|s| matches(state, s, filters))
                .map(|s| to_list_row(state, s))
                .collect();
            let total = rows.len() as u64;
            sort_rows(&mut rows, filters.sort);
            let page: Vec<SubmissionListRow> = rows
                .into_iter()
                .skip(filters.offset() as usize)
                .take(filters.page_size as usize)
                .collect();
            (page, total)
        }))
    }

    async fn version_chain(&self, id: &SubmissionId) -> Result<Vec<Submission>, RepositoryError> {
        Ok(self.store.with_state(|state| {
            let Some(submission) = state.submissions.get(&id.0) else {
                return Vec::new();
            };
            let root = submission.chain_root().clone();
            let mut chain: Vec<Submission> = state
                .submissions
                .values()
                .filter(|s| s.id == root || s.supersedes.as_ref() == Some(&root))
                .cloned()
                .collect();
            chain.sort_by(|a, b| b.version_no.cmp(&a.version_no));
            chain
        }))
    }

    async fn summarize(
        &self,
        filters: &SubmissionFilters,
    ) -> Result<ReviewSummary, RepositoryError> {
        Ok(self.store.with_state(|state| {
            let mut total = 0u64;
            let mut approved = 0u64;
            let mut pending_review = 0u64;
            let mut rejected_returned = 0u64;
            for submission in state.submissions.values().filter(|s| matches(state, s, filters)) {
                total += 1;
                match submission.current_status {
                    SubmissionStatus::Approved | SubmissionStatus::Verified => approved += 1,
                    SubmissionStatus::Pending | SubmissionStatus::UnderReview => {
                        pending_review += 1;
                    }
                    SubmissionStatus::Rejected
                    | SubmissionStatus::Returned
                    | SubmissionStatus::Suspended => rejected_returned += 1,
                }
            }
            ReviewSummary::new(total, approved, pending_review, rejected_returned)
        }))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDecisionRepository {
    store: InMemoryStore,
}

impl InMemoryDecisionRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl DecisionRepository for InMemoryDecisionRepository {
    async fn append(&self, decision: NewDecision) -> Result<Decision, RepositoryError> {
        Ok(self.store.with_state(|state| {
            state.next_seq += 1;
            let decision = Decision {
                id: decision.id,
                submission_id: decision.submission_id,
                outcome: decision.outcome,
                remarks: decision.remarks,
                decided_by: decision.decided_by,
                decided_by_role: decision.decided_by_role,
                seq: state.next_seq,
                decided_at: decision.decided_at,
            };
            state.decisions.push(decision.clone());
            decision
        }))
    }

    async fn list_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<Decision>, RepositoryError> {
        Ok(self.store.with_state(|state| {
            let mut history: Vec<Decision> = state
                .decisions
                .iter()
                .filter(|d| d.submission_id == *id)
                .cloned()
                .collect();
            history.sort_by(|a, b| b.seq.cmp(&a.seq));
            history
        }))
    }

    async fn latest_for_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Decision>, RepositoryError> {
        Ok(self.store.with_state(|state| {
            state
                .decisions
                .iter()
                .filter(|d| d.submission_id == *id)
                .max_by_key(|d| d.seq)
                .cloned()
        }))
    }
}
