use thiserror::Error;

use super::workload::ClusterError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Capacity exhausted: {message}")]
    Capacity { message: String },

    #[error("Cluster error during {operation}: {message}")]
    Cluster { operation: String, message: String },

    #[error("Hashing error: {message}")]
    Hashing { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity {
            message: message.into(),
        }
    }

    pub fn cluster(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cluster {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<ClusterError> for DomainError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::NotFound { name } => Self::not_found(format!("Workload '{}' not found", name)),
            ClusterError::AlreadyExists { name } => {
                Self::conflict(format!("Resource '{}' already exists", name))
            }
            ClusterError::Timeout { operation } => {
                Self::cluster(operation, "deadline exceeded")
            }
            ClusterError::Api { operation, message } => Self::cluster(operation, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Workload 'arena-foo' not found");
        assert_eq!(error.to_string(), "Not found: Workload 'arena-foo' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("unknown setting: foo");
        assert_eq!(error.to_string(), "Validation error: unknown setting: foo");
    }

    #[test]
    fn test_cluster_timeout_is_not_not_found() {
        let error: DomainError = ClusterError::Timeout {
            operation: "get_workload".to_string(),
        }
        .into();

        assert!(matches!(error, DomainError::Cluster { .. }));
        assert_eq!(
            error.to_string(),
            "Cluster error during get_workload: deadline exceeded"
        );
    }

    #[test]
    fn test_cluster_not_found_conversion() {
        let error: DomainError = ClusterError::NotFound {
            name: "arena-foo".to_string(),
        }
        .into();

        assert!(matches!(error, DomainError::NotFound { .. }));
    }
}
