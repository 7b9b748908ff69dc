use chrono::{DateTime, Utc};
use sqlx::Row;

use ringi_core::domain::application::{
    Application, ApplicationCodeId, ApplicationId, ApplicationStatus,
};
use ringi_core::domain::route::RouteId;

use super::{ApplicationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlApplicationRepository {
    pool: DbPool,
}

impl SqlApplicationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_status(s: &str) -> Result<ApplicationStatus, RepositoryError> {
    match s {
        "pending_approval" => Ok(ApplicationStatus::PendingApproval),
        "approved" => Ok(ApplicationStatus::Approved),
        "rejected" => Ok(ApplicationStatus::Rejected),
        "cancelled" => Ok(ApplicationStatus::Cancelled),
        other => Err(RepositoryError::Decode(format!("unknown application status `{other}`"))),
    }
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("bad timestamp in `{column}`: {e}")))
}

fn parse_optional_timestamp(
    raw: Option<String>,
    column: &str,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    raw.map(|value| parse_timestamp(&value, column)).transpose()
}

fn row_to_application(row: &sqlx::sqlite::SqliteRow) -> Result<Application, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let applicant_id: String =
        row.try_get("applicant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let application_code_id: String =
        row.try_get("application_code_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let form_data_raw: String =
        row.try_get("form_data").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approval_route_id: String =
        row.try_get("approval_route_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let current_level: i64 =
        row.try_get("current_level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approver_id: Option<String> =
        row.try_get("approver_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let submitted_at_str: String =
        row.try_get("submitted_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approved_at_str: Option<String> =
        row.try_get("approved_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rejected_at_str: Option<String> =
        row.try_get("rejected_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rejection_reason: Option<String> =
        row.try_get("rejection_reason").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let form_data = serde_json::from_str(&form_data_raw)
        .map_err(|e| RepositoryError::Decode(format!("bad form_data payload: {e}")))?;
    let current_level = u32::try_from(current_level)
        .map_err(|_| RepositoryError::Decode(format!("bad current_level `{current_level}`")))?;

    Ok(Application {
        id: ApplicationId(id),
        applicant_id,
        application_code_id: ApplicationCodeId(application_code_id),
        form_data,
        approval_route_id: RouteId(approval_route_id),
        status: parse_status(&status_str)?,
        current_level,
        approver_id,
        submitted_at: parse_timestamp(&submitted_at_str, "submitted_at")?,
        approved_at: parse_optional_timestamp(approved_at_str, "approved_at")?,
        rejected_at: parse_optional_timestamp(rejected_at_str, "rejected_at")?,
        rejection_reason,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, applicant_id, application_code_id, form_data, \
                              approval_route_id, status, current_level, approver_id, \
                              submitted_at, approved_at, rejected_at, rejection_reason, updated_at";

#[async_trait::async_trait]
impl ApplicationRepository for SqlApplicationRepository {
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let form_data = serde_json::to_string(&application.form_data)
            .map_err(|e| RepositoryError::Decode(format!("encode form_data payload: {e}")))?;

        sqlx::query(
            "INSERT INTO applications (id, applicant_id, application_code_id, form_data,
                                       approval_route_id, status, current_level, approver_id,
                                       submitted_at, approved_at, rejected_at, rejection_reason,
                                       updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&application.id.0)
        .bind(&application.applicant_id)
        .bind(&application.application_code_id.0)
        .bind(&form_data)
        .bind(&application.approval_route_id.0)
        .bind(application.status.as_str())
        .bind(application.current_level as i64)
        .bind(&application.approver_id)
        .bind(application.submitted_at.to_rfc3339())
        .bind(application.approved_at.map(|dt| dt.to_rfc3339()))
        .bind(application.rejected_at.map(|dt| dt.to_rfc3339()))
        .bind(&application.rejection_reason)
        .bind(application.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(application)
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM applications WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_application(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM applications
             WHERE applicant_id = ? ORDER BY submitted_at DESC"
        ))
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_application).collect::<Result<Vec<_>, _>>()
    }

    async fn list_pending_for_approver(
        &self,
        approver_id: &str,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM applications
             WHERE status = 'pending_approval' AND approver_id = ?
             ORDER BY submitted_at ASC"
        ))
        .bind(approver_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_application).collect::<Result<Vec<_>, _>>()
    }

    async fn update_guarded(
        &self,
        application: &Application,
        expected_status: &ApplicationStatus,
        expected_level: u32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE applications
             SET status = ?, current_level = ?, approver_id = ?, approved_at = ?,
                 rejected_at = ?, rejection_reason = ?, updated_at = ?
             WHERE id = ? AND status = ? AND current_level = ?",
        )
        .bind(application.status.as_str())
        .bind(application.current_level as i64)
        .bind(&application.approver_id)
        .bind(application.approved_at.map(|dt| dt.to_rfc3339()))
        .bind(application.rejected_at.map(|dt| dt.to_rfc3339()))
        .bind(&application.rejection_reason)
        .bind(application.updated_at.to_rfc3339())
        .bind(&application.id.0)
        .bind(expected_status.as_str())
        .bind(expected_level as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
