use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::actor::ActorRole;
use crate::domain::decision::DecisionOutcome;
use crate::domain::project::ProjectId;
use crate::domain::submission::{SubmissionCategory, SubmissionId, SubmissionStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Status,
    Project,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" | "" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "status" => Ok(Self::Status),
            "project" => Ok(Self::Project),
            other => Err(format!("unknown sort key `{other}`")),
        }
    }
}

/// Explicit, serializable listing request. Every query scope — listing,
/// grouping, summary — takes one of these; there is no shared mutable
/// filter state anywhere.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionFilters {
    pub search: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub category: Option<SubmissionCategory>,
    pub sector: Option<String>,
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
    pub sort: SortKey,
    pub page: u32,
    pub page_size: u32,
}

impl SubmissionFilters {
    /// Page numbers are 1-based; zero and oversized page sizes are clamped
    /// rather than rejected.
    pub fn normalized(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self.page_size = self.page_size.min(MAX_PAGE_SIZE);
        self.search = self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.sector = self.sector.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn offset(&self) -> u32 {
        (self.page.max(1) - 1) * self.page_size
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let page_size = u64::from(page_size.max(1));
        let total_pages = total.div_ceil(page_size).max(1) as u32;
        let page = page.max(1);
        Self {
            page,
            total,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

/// Aggregate counts over a filter scope. `approved` folds in Verified,
/// `pending_review` folds in UnderReview, and `rejected_returned` covers all
/// negative terminal-ish states, mirroring the dashboard tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total: u64,
    pub approved: u64,
    pub pending_review: u64,
    pub rejected_returned: u64,
    pub overall_percent: Decimal,
}

impl ReviewSummary {
    pub fn new(total: u64, approved: u64, pending_review: u64, rejected_returned: u64) -> Self {
        Self {
            total,
            approved,
            pending_review,
            rejected_returned,
            overall_percent: overall_percent(approved, total),
        }
    }
}

/// approved / total * 100, rounded to two decimal places; zero when the
/// scope is empty.
pub fn overall_percent(approved: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(approved) / Decimal::from(total) * Decimal::from(100)).round_dp(2)
}

/// One listing row: submission fields joined with project display fields and
/// the latest decision, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionListRow {
    pub id: SubmissionId,
    pub project_id: ProjectId,
    pub project_code: String,
    pub project_name: String,
    pub project_sector: String,
    pub category: SubmissionCategory,
    pub title: String,
    pub amount: Option<Decimal>,
    pub progress_pct: Option<Decimal>,
    pub submitted_by: String,
    pub submitted_role: ActorRole,
    pub version_no: i64,
    pub current_status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub latest_outcome: Option<DecisionOutcome>,
    pub latest_validator: Option<String>,
    pub latest_remarks: Option<String>,
    pub latest_decided_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub project_id: ProjectId,
    pub project_code: String,
    pub project_name: String,
    pub rows: Vec<SubmissionListRow>,
}

/// Fold listing rows into per-project groups for accordion display. Pure:
/// group order follows first appearance and row order is preserved, so the
/// flattened groups always equal the input.
pub fn group_by_project(rows: Vec<SubmissionListRow>) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|group| group.project_id == row.project_id) {
            Some(group) => group.rows.push(row),
            None => groups.push(ProjectGroup {
                project_id: row.project_id.clone(),
                project_code: row.project_code.clone(),
                project_name: row.project_name.clone(),
                rows: vec![row],
            }),
        }
    }
    groups
}
