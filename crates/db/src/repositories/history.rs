use chrono::{DateTime, Utc};
use sqlx::Row;

use ringi_core::domain::application::ApplicationId;
use ringi_core::domain::history::{ApprovalHistoryEntry, HistoryAction};

use super::{HistoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHistoryRepository {
    pool: DbPool,
}

impl SqlHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_action(s: &str) -> Result<HistoryAction, RepositoryError> {
    match s {
        "submitted" => Ok(HistoryAction::Submitted),
        "approved" => Ok(HistoryAction::Approved),
        "rejected" => Ok(HistoryAction::Rejected),
        "cancelled" => Ok(HistoryAction::Cancelled),
        other => Err(RepositoryError::Decode(format!("unknown history action `{other}`"))),
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalHistoryEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let application_id: String =
        row.try_get("application_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let acted_by: String =
        row.try_get("acted_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_str: String =
        row.try_get("action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let comment: String =
        row.try_get("comment").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("bad created_at for history `{id}`: {e}")))?;

    Ok(ApprovalHistoryEntry {
        id,
        application_id: ApplicationId(application_id),
        acted_by,
        action: parse_action(&action_str)?,
        comment,
        created_at,
    })
}

#[async_trait::async_trait]
impl HistoryRepository for SqlHistoryRepository {
    async fn append(&self, entry: ApprovalHistoryEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO approval_history (id, application_id, acted_by, action, comment, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.application_id.0)
        .bind(&entry.acted_by)
        .bind(entry.action.as_str())
        .bind(&entry.comment)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ApprovalHistoryEntry>, RepositoryError> {
        // rowid breaks ties for entries written within the same instant.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, application_id, acted_by, action, comment, created_at
             FROM approval_history
             WHERE application_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&application_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use ringi_core::domain::application::{Application, ApplicationCodeId, ApplicationId};
    use ringi_core::domain::history::{ApprovalHistoryEntry, HistoryAction};
    use ringi_core::domain::route::{ApprovalRoute, RouteId, RouteStep};

    use super::SqlHistoryRepository;
    use crate::repositories::{
        ApplicationRepository, HistoryRepository, RouteRepository, SqlApplicationRepository,
        SqlRouteRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    /// History rows reference applications, which reference routes.
    async fn insert_application(pool: &sqlx::SqlitePool, application_id: &str) {
        let routes = SqlRouteRepository::new(pool.clone());
        routes
            .save(ApprovalRoute {
                id: RouteId("route-1".to_string()),
                name: "経費精算ルート".to_string(),
                steps: vec![RouteStep { approver_id: "user-a".to_string() }],
                created_at: Utc::now(),
            })
            .await
            .expect("insert route");

        let applications = SqlApplicationRepository::new(pool.clone());
        applications
            .insert(Application::submitted(
                ApplicationId(application_id.to_string()),
                "user-applicant",
                ApplicationCodeId("expense".to_string()),
                json!({}),
                RouteId("route-1".to_string()),
                "user-a",
                Utc::now(),
            ))
            .await
            .expect("insert application");
    }

    #[tokio::test]
    async fn entries_come_back_in_append_order() {
        let pool = setup().await;
        insert_application(&pool, "app-1").await;

        let repo = SqlHistoryRepository::new(pool);
        let application_id = ApplicationId("app-1".to_string());

        repo.append(ApprovalHistoryEntry::new(
            application_id.clone(),
            "user-applicant",
            HistoryAction::Submitted,
            "申請を提出しました",
        ))
        .await
        .expect("append submitted");

        repo.append(ApprovalHistoryEntry::new(
            application_id.clone(),
            "user-a",
            HistoryAction::Rejected,
            "budget exceeded",
        ))
        .await
        .expect("append rejected");

        let entries = repo.list_for_application(&application_id).await.expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, HistoryAction::Submitted);
        assert_eq!(entries[1].action, HistoryAction::Rejected);
        assert_eq!(entries[1].comment, "budget exceeded");
    }
}
