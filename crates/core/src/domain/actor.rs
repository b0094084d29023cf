use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::submission::SubmissionCategory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Contractor,
    Engineer,
    Admin,
    SuperAdmin,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown actor role `{0}` (expected contractor|engineer|admin|super_admin)")]
pub struct ParseActorRoleError(pub String);

impl std::str::FromStr for ActorRole {
    type Err = ParseActorRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contractor" => Ok(Self::Contractor),
            "engineer" => Ok(Self::Engineer),
            "admin" => Ok(Self::Admin),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            other => Err(ParseActorRoleError(other.to_string())),
        }
    }
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contractor => "contractor",
            Self::Engineer => "engineer",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Reviewer capability per submission category. Engineers sign off on
    /// field work, admins on money and project-state changes, super admins
    /// on everything. Contractors submit but never review.
    pub fn can_review(&self, category: &SubmissionCategory) -> bool {
        match self {
            Self::SuperAdmin => true,
            Self::Engineer => matches!(
                category,
                SubmissionCategory::Deliverable | SubmissionCategory::ProgressUpdate
            ),
            Self::Admin => matches!(
                category,
                SubmissionCategory::Expense | SubmissionCategory::StatusChange
            ),
            Self::Contractor => false,
        }
    }
}

/// Authenticated identity handed in by the session/RBAC layer upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: ActorRole,
}

#[cfg(test)]
mod tests {
    use super::ActorRole;
    use crate::domain::submission::SubmissionCategory;

    #[test]
    fn engineer_reviews_field_work_only() {
        assert!(ActorRole::Engineer.can_review(&SubmissionCategory::Deliverable));
        assert!(ActorRole::Engineer.can_review(&SubmissionCategory::ProgressUpdate));
        assert!(!ActorRole::Engineer.can_review(&SubmissionCategory::Expense));
        assert!(!ActorRole::Engineer.can_review(&SubmissionCategory::StatusChange));
    }

    #[test]
    fn admin_reviews_money_and_state_changes() {
        assert!(ActorRole::Admin.can_review(&SubmissionCategory::Expense));
        assert!(ActorRole::Admin.can_review(&SubmissionCategory::StatusChange));
        assert!(!ActorRole::Admin.can_review(&SubmissionCategory::Deliverable));
    }

    #[test]
    fn super_admin_reviews_everything_contractor_nothing() {
        for category in [
            SubmissionCategory::Deliverable,
            SubmissionCategory::ProgressUpdate,
            SubmissionCategory::Expense,
            SubmissionCategory::StatusChange,
        ] {
            assert!(ActorRole::SuperAdmin.can_review(&category));
            assert!(!ActorRole::Contractor.can_review(&category));
        }
    }

    #[test]
    fn role_parses_from_header_strings() {
        assert_eq!("engineer".parse::<ActorRole>().unwrap(), ActorRole::Engineer);
        assert_eq!(" Super_Admin ".parse::<ActorRole>().unwrap(), ActorRole::SuperAdmin);
        assert!("mayor".parse::<ActorRole>().is_err());
    }
}
