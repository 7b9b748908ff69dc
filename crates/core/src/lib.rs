pub mod config;
pub mod domain;
pub mod errors;

pub use domain::activity::{ActivityAction, ActivityLogEntry};
pub use domain::application::{
    Application, ApplicationCodeId, ApplicationId, ApplicationStatus,
    CANCELLED_BY_APPLICANT_REASON,
};
pub use domain::history::{
    ApprovalHistoryEntry, HistoryAction, DEFAULT_APPROVAL_COMMENT, SUBMISSION_COMMENT,
};
pub use domain::route::{ApprovalRoute, RouteId, RouteStep};
pub use errors::{DomainError, InterfaceError, WorkflowError};
