use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use ringi_core::domain::activity::{ActivityAction, ActivityLogEntry};
use ringi_core::domain::application::{Application, ApplicationCodeId, ApplicationId};
use ringi_core::domain::history::{
    ApprovalHistoryEntry, HistoryAction, DEFAULT_APPROVAL_COMMENT, SUBMISSION_COMMENT,
};
use ringi_core::domain::route::{ApprovalRoute, RouteId};
use ringi_core::errors::WorkflowError;

use crate::repositories::{
    ActivityLogRepository, ApplicationRepository, HistoryRepository, RouteRepository,
};

/// Submission input. `form_data` is carried opaquely; its shape is owned by
/// the request-type definition, not by the workflow.
#[derive(Clone, Debug)]
pub struct SubmitApplication {
    pub applicant_id: String,
    pub application_code_id: ApplicationCodeId,
    pub form_data: Value,
    pub approval_route_id: RouteId,
}

/// Sequential multi-step approval engine.
///
/// Every operation runs validate, then mutate, then audit. The two audit
/// appends are best-effort: the committed state transition is the source of
/// truth, and a failed append is logged and swallowed rather than rolled
/// back. Authorization (that the acting user is the awaited approver) is
/// enforced by the access-policy layer in front of this engine, not here.
pub struct WorkflowEngine<A, R, H, L> {
    applications: A,
    routes: R,
    history: H,
    activity: L,
}

impl<A, R, H, L> WorkflowEngine<A, R, H, L>
where
    A: ApplicationRepository,
    R: RouteRepository,
    H: HistoryRepository,
    L: ActivityLogRepository,
{
    pub fn new(applications: A, routes: R, history: H, activity: L) -> Self {
        Self { applications, routes, history, activity }
    }

    pub async fn submit(&self, request: SubmitApplication) -> Result<Application, WorkflowError> {
        let route = self.load_route(&request.approval_route_id).await?;
        let Some(first_approver) = route.first_approver() else {
            return Err(WorkflowError::Configuration(format!(
                "no approvers configured for route `{}`",
                route.id.0
            )));
        };

        let application = Application::submitted(
            ApplicationId(Uuid::new_v4().to_string()),
            request.applicant_id.clone(),
            request.application_code_id,
            request.form_data,
            request.approval_route_id,
            first_approver,
            Utc::now(),
        );

        let application = self
            .applications
            .insert(application)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("insert application: {e}")))?;

        tracing::info!(
            event_name = "workflow.application_submitted",
            application_id = %application.id.0,
            applicant_id = %application.applicant_id,
            route_id = %application.approval_route_id.0,
            "application submitted"
        );

        self.append_audit(
            ActivityLogEntry::new(
                &request.applicant_id,
                ActivityAction::ApplicationSubmitted,
                json!({
                    "application_id": &application.id.0,
                    "application_code_id": &application.application_code_id.0,
                    "approval_route_id": &application.approval_route_id.0,
                }),
            ),
            ApprovalHistoryEntry::new(
                application.id.clone(),
                &request.applicant_id,
                HistoryAction::Submitted,
                SUBMISSION_COMMENT,
            ),
        )
        .await;

        Ok(application)
    }

    pub async fn approve(
        &self,
        application_id: &ApplicationId,
        acting_user: &str,
        comment: &str,
    ) -> Result<Application, WorkflowError> {
        let application = self.load(application_id).await?;
        let route = self.load_route(&application.approval_route_id).await?;
        if route.steps.is_empty() {
            return Err(WorkflowError::Configuration(format!(
                "no approvers configured for route `{}`",
                route.id.0
            )));
        }

        let expected_status = application.status.clone();
        let expected_level = application.current_level;
        let next_level = application.current_level + 1;

        let mut updated = application.clone();
        if next_level > route.step_count() {
            updated.finalize_approval(Utc::now())?;
        } else {
            let next_approver = route.approver_at(next_level).ok_or_else(|| {
                WorkflowError::Configuration(format!(
                    "next approver not found at level {next_level} of route `{}`; \
                     check the approval route definition",
                    route.id.0
                ))
            })?;
            updated.advance(next_level, next_approver, Utc::now())?;
        }

        self.persist_transition(&updated, &expected_status, expected_level, "approve").await?;

        tracing::info!(
            event_name = "workflow.application_approved",
            application_id = %updated.id.0,
            acting_user = %acting_user,
            old_level = expected_level,
            new_level = updated.current_level,
            status = updated.status.as_str(),
            "application approved"
        );

        let comment =
            if comment.trim().is_empty() { DEFAULT_APPROVAL_COMMENT } else { comment };
        self.append_audit(
            ActivityLogEntry::new(
                acting_user,
                ActivityAction::ApplicationApproved,
                json!({
                    "application_id": &updated.id.0,
                    "old_level": expected_level,
                    "new_level": updated.current_level,
                    "status": updated.status.as_str(),
                }),
            ),
            ApprovalHistoryEntry::new(
                updated.id.clone(),
                acting_user,
                HistoryAction::Approved,
                comment,
            ),
        )
        .await;

        Ok(updated)
    }

    pub async fn reject(
        &self,
        application_id: &ApplicationId,
        reason: &str,
        acting_user: &str,
    ) -> Result<Application, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::Validation(
                "rejection reason must not be empty".to_string(),
            ));
        }

        let application = self.load(application_id).await?;
        let expected_status = application.status.clone();
        let expected_level = application.current_level;

        let mut updated = application;
        updated.reject(reason, Utc::now())?;

        self.persist_transition(&updated, &expected_status, expected_level, "reject").await?;

        tracing::info!(
            event_name = "workflow.application_rejected",
            application_id = %updated.id.0,
            acting_user = %acting_user,
            level = expected_level,
            "application rejected"
        );

        self.append_audit(
            ActivityLogEntry::new(
                acting_user,
                ActivityAction::ApplicationRejected,
                json!({
                    "application_id": &updated.id.0,
                    "level": expected_level,
                    "reason": reason,
                }),
            ),
            ApprovalHistoryEntry::new(
                updated.id.clone(),
                acting_user,
                HistoryAction::Rejected,
                reason,
            ),
        )
        .await;

        Ok(updated)
    }

    pub async fn cancel(
        &self,
        application_id: &ApplicationId,
        acting_user: &str,
    ) -> Result<Application, WorkflowError> {
        let application = self.load(application_id).await?;
        let expected_status = application.status.clone();
        let expected_level = application.current_level;

        let mut updated = application;
        updated.cancel(Utc::now())?;

        self.persist_transition(&updated, &expected_status, expected_level, "cancel").await?;

        tracing::info!(
            event_name = "workflow.application_cancelled",
            application_id = %updated.id.0,
            acting_user = %acting_user,
            "application cancelled"
        );

        let reason = updated
            .rejection_reason
            .clone()
            .unwrap_or_else(|| ringi_core::CANCELLED_BY_APPLICANT_REASON.to_string());
        self.append_audit(
            ActivityLogEntry::new(
                acting_user,
                ActivityAction::ApplicationCancelled,
                json!({"application_id": &updated.id.0}),
            ),
            ApprovalHistoryEntry::new(
                updated.id.clone(),
                acting_user,
                HistoryAction::Cancelled,
                reason,
            ),
        )
        .await;

        Ok(updated)
    }

    pub async fn find_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<Application>, WorkflowError> {
        self.applications
            .find_by_id(application_id)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("load application: {e}")))
    }

    pub async fn application_history(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ApprovalHistoryEntry>, WorkflowError> {
        self.history
            .list_for_application(application_id)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("load approval history: {e}")))
    }

    pub async fn applications_for_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<Application>, WorkflowError> {
        self.applications
            .list_by_applicant(applicant_id)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("list applications: {e}")))
    }

    pub async fn pending_for_approver(
        &self,
        approver_id: &str,
    ) -> Result<Vec<Application>, WorkflowError> {
        self.applications
            .list_pending_for_approver(approver_id)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("list approver inbox: {e}")))
    }

    pub async fn routes(&self) -> Result<Vec<ApprovalRoute>, WorkflowError> {
        self.routes
            .list_all()
            .await
            .map_err(|e| WorkflowError::Persistence(format!("list approval routes: {e}")))
    }

    async fn load(&self, application_id: &ApplicationId) -> Result<Application, WorkflowError> {
        self.find_application(application_id).await?.ok_or_else(|| {
            WorkflowError::Validation(format!("application `{}` not found", application_id.0))
        })
    }

    async fn load_route(&self, route_id: &RouteId) -> Result<ApprovalRoute, WorkflowError> {
        let route = self
            .routes
            .find_by_id(route_id)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("load approval route: {e}")))?;

        route.ok_or_else(|| {
            WorkflowError::Configuration(format!("no approvers configured for route `{}`", route_id.0))
        })
    }

    async fn persist_transition(
        &self,
        updated: &Application,
        expected_status: &ringi_core::ApplicationStatus,
        expected_level: u32,
        operation: &str,
    ) -> Result<(), WorkflowError> {
        let applied = self
            .applications
            .update_guarded(updated, expected_status, expected_level)
            .await
            .map_err(|e| WorkflowError::Persistence(format!("{operation} application: {e}")))?;

        if !applied {
            return Err(WorkflowError::Conflict(format!(
                "application `{}` changed concurrently; reload and retry",
                updated.id.0
            )));
        }
        Ok(())
    }

    async fn append_audit(&self, activity: ActivityLogEntry, history: ApprovalHistoryEntry) {
        if let Err(error) = self.activity.append(activity).await {
            tracing::warn!(
                event_name = "workflow.audit.activity_write_failed",
                error = %error,
                "activity log append failed; the state transition stands"
            );
        }
        if let Err(error) = self.history.append(history).await {
            tracing::warn!(
                event_name = "workflow.audit.history_write_failed",
                error = %error,
                "approval history append failed; the state transition stands"
            );
        }
    }
}
