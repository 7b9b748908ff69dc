use chrono::{DateTime, Utc};
use sqlx::Row;

use ringi_core::domain::activity::{ActivityAction, ActivityLogEntry};

use super::{ActivityLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlActivityLogRepository {
    pool: DbPool,
}

impl SqlActivityLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_action(s: &str) -> Result<ActivityAction, RepositoryError> {
    match s {
        "application_submitted" => Ok(ActivityAction::ApplicationSubmitted),
        "application_approved" => Ok(ActivityAction::ApplicationApproved),
        "application_rejected" => Ok(ActivityAction::ApplicationRejected),
        "application_cancelled" => Ok(ActivityAction::ApplicationCancelled),
        other => Err(RepositoryError::Decode(format!("unknown activity action `{other}`"))),
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityLogEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_str: String =
        row.try_get("action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let detail_raw: String =
        row.try_get("detail").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let detail = serde_json::from_str(&detail_raw)
        .map_err(|e| RepositoryError::Decode(format!("bad detail payload for log `{id}`: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("bad created_at for log `{id}`: {e}")))?;

    Ok(ActivityLogEntry { id, user_id, action: parse_action(&action_str)?, detail, created_at })
}

#[async_trait::async_trait]
impl ActivityLogRepository for SqlActivityLogRepository {
    async fn append(&self, entry: ActivityLogEntry) -> Result<(), RepositoryError> {
        let detail = serde_json::to_string(&entry.detail)
            .map_err(|e| RepositoryError::Decode(format!("encode detail payload: {e}")))?;

        sqlx::query(
            "INSERT INTO user_activity_logs (id, user_id, action, detail, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.action.as_str())
        .bind(&detail)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivityLogEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, user_id, action, detail, created_at
             FROM user_activity_logs
             WHERE user_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }
}
