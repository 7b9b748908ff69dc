use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::application::ApplicationId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Submitted,
    Approved,
    Rejected,
    Cancelled,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Comment recorded for an approval when the approver left none.
pub const DEFAULT_APPROVAL_COMMENT: &str = "承認します";

/// Comment recorded on the submission ledger entry.
pub const SUBMISSION_COMMENT: &str = "申請を提出しました";

/// One append-only ledger record: one action by one user on one application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalHistoryEntry {
    pub id: String,
    pub application_id: ApplicationId,
    pub acted_by: String,
    pub action: HistoryAction,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ApprovalHistoryEntry {
    pub fn new(
        application_id: ApplicationId,
        acted_by: impl Into<String>,
        action: HistoryAction,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            application_id,
            acted_by: acted_by.into(),
            action,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}
