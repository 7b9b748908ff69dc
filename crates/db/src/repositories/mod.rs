use async_trait::async_trait;
use thiserror::Error;

use ringi_core::domain::activity::ActivityLogEntry;
use ringi_core::domain::application::{Application, ApplicationId, ApplicationStatus};
use ringi_core::domain::history::ApprovalHistoryEntry;
use ringi_core::domain::route::{ApprovalRoute, RouteId};

pub mod activity;
pub mod application;
pub mod history;
pub mod memory;
pub mod route;

pub use activity::SqlActivityLogRepository;
pub use application::SqlApplicationRepository;
pub use history::SqlHistoryRepository;
pub use memory::{
    InMemoryActivityLogRepository, InMemoryApplicationRepository, InMemoryHistoryRepository,
    InMemoryRouteRepository,
};
pub use route::SqlRouteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError>;

    async fn find_by_id(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;

    async fn list_by_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<Application>, RepositoryError>;

    /// The approver inbox: applications currently waiting on one identity.
    async fn list_pending_for_approver(
        &self,
        approver_id: &str,
    ) -> Result<Vec<Application>, RepositoryError>;

    /// Write all mutable fields, guarded on the previously read
    /// `(status, current_level)` pair. Returns false when the guard missed,
    /// i.e. a concurrent writer got there first.
    async fn update_guarded(
        &self,
        application: &Application,
        expected_status: &ApplicationStatus,
        expected_level: u32,
    ) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn find_by_id(&self, id: &RouteId) -> Result<Option<ApprovalRoute>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<ApprovalRoute>, RepositoryError>;
    async fn save(&self, route: ApprovalRoute) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: ApprovalHistoryEntry) -> Result<(), RepositoryError>;
    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ApprovalHistoryEntry>, RepositoryError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: ActivityLogEntry) -> Result<(), RepositoryError>;
    async fn list_for_user(&self, user_id: &str)
        -> Result<Vec<ActivityLogEntry>, RepositoryError>;
}
