use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::route::RouteId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Reference to the request-type definition (expense, leave, daily report).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationCodeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingApproval)
    }
}

/// Reason recorded when an applicant withdraws their own application.
pub const CANCELLED_BY_APPLICANT_REASON: &str = "申請者によりキャンセルされました";

/// A submitted request moving through the steps of an approval route.
///
/// `form_data` is owned entirely by the submitter; the workflow never reads
/// or rewrites it. `current_level` is 1-based and freezes at the last step
/// index once the final approval lands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: String,
    pub application_code_id: ApplicationCodeId,
    pub form_data: Value,
    pub approval_route_id: RouteId,
    pub status: ApplicationStatus,
    pub current_level: u32,
    pub approver_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// A freshly submitted application awaiting its first approver.
    #[allow(clippy::too_many_arguments)]
    pub fn submitted(
        id: ApplicationId,
        applicant_id: impl Into<String>,
        application_code_id: ApplicationCodeId,
        form_data: Value,
        approval_route_id: RouteId,
        first_approver: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            applicant_id: applicant_id.into(),
            application_code_id,
            form_data,
            approval_route_id,
            status: ApplicationStatus::PendingApproval,
            current_level: 1,
            approver_id: Some(first_approver.into()),
            submitted_at: now,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            updated_at: now,
        }
    }

    fn ensure_pending(&self, attempted: ApplicationStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidApplicationTransition {
                from: self.status.clone(),
                to: attempted,
            });
        }
        Ok(())
    }

    /// Hand the application to the approver at `next_level`.
    pub fn advance(
        &mut self,
        next_level: u32,
        next_approver: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending(ApplicationStatus::PendingApproval)?;
        if next_level != self.current_level + 1 {
            return Err(DomainError::InvariantViolation(format!(
                "approval level must advance from {} to {}, not {next_level}",
                self.current_level,
                self.current_level + 1,
            )));
        }

        self.current_level = next_level;
        self.approver_id = Some(next_approver.into());
        self.updated_at = now;
        Ok(())
    }

    /// Final approval: terminal, with `current_level` frozen at the last step.
    pub fn finalize_approval(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending(ApplicationStatus::Approved)?;

        self.status = ApplicationStatus::Approved;
        self.approved_at = Some(now);
        self.approver_id = None;
        self.updated_at = now;
        Ok(())
    }

    /// Rejection is terminal from any step; `current_level` keeps its value.
    pub fn reject(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending(ApplicationStatus::Rejected)?;

        self.status = ApplicationStatus::Rejected;
        self.rejected_at = Some(now);
        self.rejection_reason = Some(reason.into());
        self.approver_id = None;
        self.updated_at = now;
        Ok(())
    }

    /// Withdrawal by the applicant. `rejected_at` doubles as the closed-at
    /// timestamp, matching the rejection shape.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending(ApplicationStatus::Cancelled)?;

        self.status = ApplicationStatus::Cancelled;
        self.rejected_at = Some(now);
        self.rejection_reason = Some(CANCELLED_BY_APPLICANT_REASON.to_string());
        self.approver_id = None;
        self.updated_at = now;
        Ok(())
    }
}
