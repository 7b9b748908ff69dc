use thiserror::Error;

use crate::domain::application::ApplicationStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid application transition from {from:?} to {to:?}")]
    InvalidApplicationTransition { from: ApplicationStatus, to: ApplicationStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failure taxonomy for the four workflow entry points.
///
/// `Configuration` covers broken route definitions, `Validation` covers
/// caller input rejected before any write, `Persistence` wraps store
/// failures with the operation that hit them, and `Conflict` signals a
/// guarded update that lost to a concurrent writer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("validation failure: {0}")]
    Validation(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("concurrent update conflict: {0}")]
    Conflict(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Conflict { .. } => {
                "The application was changed by someone else. Reload and retry."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl WorkflowError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<WorkflowError> for InterfaceError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Domain(DomainError::InvalidApplicationTransition { .. })
            | WorkflowError::Domain(DomainError::InvariantViolation(_))
            | WorkflowError::Validation(_) => Self::BadRequest {
                message: "workflow validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            WorkflowError::Conflict(message) => {
                Self::Conflict { message, correlation_id: "unassigned".to_owned() }
            }
            WorkflowError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            WorkflowError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{DomainError, InterfaceError, WorkflowError};

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface = WorkflowError::Validation("rejection reason must not be empty".to_owned())
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn domain_error_maps_to_bad_request() {
        let interface = WorkflowError::from(DomainError::InvariantViolation(
            "approval level must advance by one".to_owned(),
        ))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn conflict_error_keeps_its_own_interface_class() {
        let interface =
            WorkflowError::Conflict("application `app-1` changed concurrently".to_owned())
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
        assert_eq!(
            interface.user_message(),
            "The application was changed by someone else. Reload and retry."
        );
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface =
            WorkflowError::Persistence("insert application: database lock timeout".to_owned())
                .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            WorkflowError::Configuration("no approvers configured for route `route-1`".to_owned())
                .into_interface("req-5");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
