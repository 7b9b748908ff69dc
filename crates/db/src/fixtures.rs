use chrono::Utc;

use ringi_core::domain::route::{ApprovalRoute, RouteId, RouteStep};

use crate::repositories::{RepositoryError, RouteRepository, SqlRouteRepository};
use crate::DbPool;

/// Deterministic demo routes for local development: the three request types
/// the back office actually runs, with one to three approval steps each.
const SEED_ROUTES: &[(&str, &str, &[&str])] = &[
    ("route-expense", "経費精算ルート", &["mgr-tanaka", "dir-suzuki", "cfo-watanabe"]),
    ("route-leave", "休暇申請ルート", &["mgr-tanaka"]),
    ("route-daily-report", "日報ルート", &["mgr-tanaka", "dir-suzuki"]),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub routes: Vec<SeedRouteInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedRouteInfo {
    pub route_id: &'static str,
    pub name: &'static str,
    pub step_count: usize,
}

/// Upserts the demo routes; safe to run repeatedly.
pub async fn seed_demo_routes(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let repo = SqlRouteRepository::new(pool.clone());
    let mut routes = Vec::with_capacity(SEED_ROUTES.len());

    for (route_id, name, approvers) in SEED_ROUTES.iter().copied() {
        repo.save(ApprovalRoute {
            id: RouteId(route_id.to_string()),
            name: name.to_string(),
            steps: approvers
                .iter()
                .map(|approver| RouteStep { approver_id: approver.to_string() })
                .collect(),
            created_at: Utc::now(),
        })
        .await?;

        routes.push(SeedRouteInfo { route_id, name, step_count: approvers.len() });
    }

    Ok(SeedSummary { routes })
}
