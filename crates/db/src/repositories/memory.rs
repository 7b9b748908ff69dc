use std::collections::HashMap;

use tokio::sync::RwLock;

use ringi_core::domain::activity::ActivityLogEntry;
use ringi_core::domain::application::{Application, ApplicationId, ApplicationStatus};
use ringi_core::domain::history::ApprovalHistoryEntry;
use ringi_core::domain::route::{ApprovalRoute, RouteId};

use super::{
    ActivityLogRepository, ApplicationRepository, HistoryRepository, RepositoryError,
    RouteRepository,
};

#[derive(Default)]
pub struct InMemoryApplicationRepository {
    applications: RwLock<HashMap<String, Application>>,
}

#[async_trait::async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut applications = self.applications.write().await;
        applications.insert(application.id.0.clone(), application.clone());
        Ok(application)
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        Ok(applications.get(&id.0).cloned())
    }

    async fn list_by_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        let mut matching: Vec<Application> = applications
            .values()
            .filter(|application| application.applicant_id == applicant_id)
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
        Ok(matching)
    }

    async fn list_pending_for_approver(
        &self,
        approver_id: &str,
    ) -> Result<Vec<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        let mut matching: Vec<Application> = applications
            .values()
            .filter(|application| {
                application.status == ApplicationStatus::PendingApproval
                    && application.approver_id.as_deref() == Some(approver_id)
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| left.submitted_at.cmp(&right.submitted_at));
        Ok(matching)
    }

    async fn update_guarded(
        &self,
        application: &Application,
        expected_status: &ApplicationStatus,
        expected_level: u32,
    ) -> Result<bool, RepositoryError> {
        let mut applications = self.applications.write().await;
        match applications.get_mut(&application.id.0) {
            Some(stored)
                if stored.status == *expected_status
                    && stored.current_level == expected_level =>
            {
                *stored = application.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryRouteRepository {
    routes: RwLock<HashMap<String, ApprovalRoute>>,
}

#[async_trait::async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn find_by_id(&self, id: &RouteId) -> Result<Option<ApprovalRoute>, RepositoryError> {
        let routes = self.routes.read().await;
        Ok(routes.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ApprovalRoute>, RepositoryError> {
        let routes = self.routes.read().await;
        let mut all: Vec<ApprovalRoute> = routes.values().cloned().collect();
        all.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(all)
    }

    async fn save(&self, route: ApprovalRoute) -> Result<(), RepositoryError> {
        let mut routes = self.routes.write().await;
        routes.insert(route.id.0.clone(), route);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryHistoryRepository {
    entries: RwLock<Vec<ApprovalHistoryEntry>>,
}

#[async_trait::async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, entry: ApprovalHistoryEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ApprovalHistoryEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| entry.application_id == *application_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryActivityLogRepository {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

#[async_trait::async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn append(&self, entry: ActivityLogEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivityLogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|entry| entry.user_id == user_id).cloned().collect())
    }
}
