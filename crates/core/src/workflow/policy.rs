use serde::{Deserialize, Serialize};

use crate::domain::decision::DecisionOutcome;
use crate::domain::submission::SubmissionCategory;

/// Allowed reviewer outcomes for one submission category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub category: SubmissionCategory,
    pub allowed_outcomes: Vec<DecisionOutcome>,
}

/// Per-category review rules, resolved once at startup and passed into the
/// engine. Deliverables, progress updates, and expenses use the plain
/// approve/reject/return set; status-change requests go through the fuller
/// verification flow including suspension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    categories: Vec<CategoryPolicy>,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        use DecisionOutcome::{Approved, Rejected, Returned, Suspended, Verified};

        let basic = vec![Approved, Rejected, Returned];
        Self {
            categories: vec![
                CategoryPolicy {
                    category: SubmissionCategory::Deliverable,
                    allowed_outcomes: basic.clone(),
                },
                CategoryPolicy {
                    category: SubmissionCategory::ProgressUpdate,
                    allowed_outcomes: basic.clone(),
                },
                CategoryPolicy {
                    category: SubmissionCategory::Expense,
                    allowed_outcomes: basic,
                },
                CategoryPolicy {
                    category: SubmissionCategory::StatusChange,
                    allowed_outcomes: vec![Verified, Approved, Rejected, Returned, Suspended],
                },
            ],
        }
    }
}

impl ReviewPolicy {
    pub fn new(categories: Vec<CategoryPolicy>) -> Self {
        Self { categories }
    }

    pub fn allows(&self, category: &SubmissionCategory, outcome: &DecisionOutcome) -> bool {
        self.categories
            .iter()
            .find(|policy| policy.category == *category)
            .is_some_and(|policy| policy.allowed_outcomes.contains(outcome))
    }

    pub fn allowed_outcomes(&self, category: &SubmissionCategory) -> &[DecisionOutcome] {
        self.categories
            .iter()
            .find(|policy| policy.category == *category)
            .map(|policy| policy.allowed_outcomes.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewPolicy;
    use crate::domain::decision::DecisionOutcome;
    use crate::domain::submission::SubmissionCategory;

    #[test]
    fn deliverables_use_the_basic_outcome_set() {
        let policy = ReviewPolicy::default();

        assert!(policy.allows(&SubmissionCategory::Deliverable, &DecisionOutcome::Approved));
        assert!(policy.allows(&SubmissionCategory::Deliverable, &DecisionOutcome::Returned));
        assert!(!policy.allows(&SubmissionCategory::Deliverable, &DecisionOutcome::Verified));
        assert!(!policy.allows(&SubmissionCategory::Deliverable, &DecisionOutcome::Suspended));
    }

    #[test]
    fn status_changes_use_the_full_outcome_set() {
        let policy = ReviewPolicy::default();

        for outcome in [
            DecisionOutcome::Verified,
            DecisionOutcome::Approved,
            DecisionOutcome::Rejected,
            DecisionOutcome::Returned,
            DecisionOutcome::Suspended,
        ] {
            assert!(policy.allows(&SubmissionCategory::StatusChange, &outcome), "{outcome:?}");
        }
    }

    #[test]
    fn empty_policy_allows_nothing() {
        let policy = ReviewPolicy::new(Vec::new());
        assert!(!policy.allows(&SubmissionCategory::Expense, &DecisionOutcome::Approved));
        assert!(policy.allowed_outcomes(&SubmissionCategory::Expense).is_empty());
    }
}
