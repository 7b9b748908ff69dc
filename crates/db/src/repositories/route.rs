use chrono::{DateTime, Utc};
use sqlx::Row;

use ringi_core::domain::route::{ApprovalRoute, RouteId, RouteStep};

use super::{RepositoryError, RouteRepository};
use crate::DbPool;

pub struct SqlRouteRepository {
    pool: DbPool,
}

impl SqlRouteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_route(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRoute, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let steps_raw: String =
        row.try_get("steps").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let steps: Vec<RouteStep> = serde_json::from_str(&steps_raw)
        .map_err(|e| RepositoryError::Decode(format!("bad steps payload for route `{id}`: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("bad created_at for route `{id}`: {e}")))?;

    Ok(ApprovalRoute { id: RouteId(id), name, steps, created_at })
}

#[async_trait::async_trait]
impl RouteRepository for SqlRouteRepository {
    async fn find_by_id(&self, id: &RouteId) -> Result<Option<ApprovalRoute>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, steps, created_at FROM approval_routes WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_route(r)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<ApprovalRoute>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query("SELECT id, name, steps, created_at FROM approval_routes ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_route).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, route: ApprovalRoute) -> Result<(), RepositoryError> {
        let steps = serde_json::to_string(&route.steps)
            .map_err(|e| RepositoryError::Decode(format!("encode steps payload: {e}")))?;

        sqlx::query(
            "INSERT INTO approval_routes (id, name, steps, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 steps = excluded.steps",
        )
        .bind(&route.id.0)
        .bind(&route.name)
        .bind(&steps)
        .bind(route.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
