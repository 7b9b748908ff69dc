use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    ApplicationSubmitted,
    ApplicationApproved,
    ApplicationRejected,
    ApplicationCancelled,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationSubmitted => "application_submitted",
            Self::ApplicationApproved => "application_approved",
            Self::ApplicationRejected => "application_rejected",
            Self::ApplicationCancelled => "application_cancelled",
        }
    }
}

/// Operational record of one user action, written alongside every workflow
/// transition. Independent of the per-application approval ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub user_id: String,
    pub action: ActivityAction,
    pub detail: Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(user_id: impl Into<String>, action: ActivityAction, detail: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            action,
            detail,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ActivityAction, ActivityLogEntry};

    #[test]
    fn entries_carry_structured_detail() {
        let entry = ActivityLogEntry::new(
            "user-a",
            ActivityAction::ApplicationApproved,
            json!({"application_id": "app-1", "old_level": 1, "new_level": 2}),
        );

        assert_eq!(entry.user_id, "user-a");
        assert_eq!(entry.action.as_str(), "application_approved");
        assert_eq!(entry.detail["new_level"], 2);
    }
}
