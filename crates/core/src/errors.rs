use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed dish `{name}`: {reason}")]
    MalformedDish { name: String, reason: String },
    #[error("score for `{name}` is not a finite number")]
    NonFiniteScore { name: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog failure: {0}")]
    Catalog(String),
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => {
                "The dish catalog is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            // Bad catalog rows are a data problem on our side, not the caller's.
            ApplicationError::Domain(DomainError::MalformedDish { .. })
            | ApplicationError::Domain(DomainError::NonFiniteScore { .. }) => Self::Internal {
                message: "recommendation computation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Catalog(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, CatalogError, DomainError, InterfaceError};

    #[test]
    fn malformed_dish_maps_to_internal_interface_error() {
        let interface = ApplicationError::from(DomainError::MalformedDish {
            name: "김치전".to_owned(),
            reason: "negative price".to_owned(),
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Internal {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn internal_message_does_not_leak_row_details() {
        let interface = ApplicationError::from(DomainError::MalformedDish {
            name: "secret-row".to_owned(),
            reason: "bad".to_owned(),
        })
        .into_interface("req-2");

        assert!(!interface.to_string().contains("secret-row"));
    }

    #[test]
    fn catalog_error_maps_to_service_unavailable() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = CatalogError::Read { path: "dishes.json".into(), source };
        let interface = ApplicationError::from(error).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(
            interface.user_message(),
            "The dish catalog is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn non_finite_score_maps_to_internal() {
        let interface = ApplicationError::from(DomainError::NonFiniteScore { name: "잡채".to_owned() })
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.correlation_id(), "req-4");
    }
}
