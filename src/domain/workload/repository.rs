//! Cluster control-plane contract

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use super::entity::{ServiceSpec, Workload, WorkloadSpec};

/// Errors returned by a cluster collaborator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    #[error("Resource '{name}' not found")]
    NotFound { name: String },

    #[error("Resource '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("Cluster call {operation} timed out")]
    Timeout { operation: String },

    #[error("Cluster call {operation} failed: {message}")]
    Api { operation: String, message: String },
}

impl ClusterError {
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Resource CRUD against the cluster, scoped by namespace and resource name.
///
/// Workloads and services of a team share the same name.
#[async_trait]
pub trait ClusterClient: Send + Sync + std::fmt::Debug {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError>;

    async fn create_workload(
        &self,
        namespace: &str,
        spec: &WorkloadSpec,
    ) -> Result<Workload, ClusterError>;

    /// Merge the given annotations into the workload's metadata, leaving everything else untouched
    async fn patch_workload_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Workload, ClusterError>;

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// Replace the workload's running replicas without touching its metadata
    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn create_service(&self, namespace: &str, spec: &ServiceSpec) -> Result<(), ClusterError>;

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// List workloads carrying every given label
    async fn list_workloads(
        &self,
        namespace: &str,
        label_selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Workload>, ClusterError>;
}
