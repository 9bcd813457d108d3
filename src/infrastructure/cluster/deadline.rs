//! Deadline enforcement for cluster calls

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ClusterClient, ClusterError, ServiceSpec, Workload, WorkloadSpec};

/// Wraps a cluster client so that every call fails with
/// [`ClusterError::Timeout`] once it exceeds the configured deadline
#[derive(Debug, Clone)]
pub struct DeadlineClusterClient {
    inner: Arc<dyn ClusterClient>,
    timeout: Duration,
}

impl DeadlineClusterClient {
    pub fn new(inner: Arc<dyn ClusterClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, ClusterError>>,
    ) -> Result<T, ClusterError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ClusterError::Timeout {
                operation: operation.to_string(),
            })?
    }
}

#[async_trait]
impl ClusterClient for DeadlineClusterClient {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.bounded("get_workload", self.inner.get_workload(namespace, name))
            .await
    }

    async fn create_workload(
        &self,
        namespace: &str,
        spec: &WorkloadSpec,
    ) -> Result<Workload, ClusterError> {
        self.bounded("create_workload", self.inner.create_workload(namespace, spec))
            .await
    }

    async fn patch_workload_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Workload, ClusterError> {
        self.bounded(
            "patch_workload_annotations",
            self.inner
                .patch_workload_annotations(namespace, name, annotations),
        )
        .await
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.bounded("delete_workload", self.inner.delete_workload(namespace, name))
            .await
    }

    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.bounded("restart_workload", self.inner.restart_workload(namespace, name))
            .await
    }

    async fn create_service(&self, namespace: &str, spec: &ServiceSpec) -> Result<(), ClusterError> {
        self.bounded("create_service", self.inner.create_service(namespace, spec))
            .await
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.bounded("delete_service", self.inner.delete_service(namespace, name))
            .await
    }

    async fn list_workloads(
        &self,
        namespace: &str,
        label_selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Workload>, ClusterError> {
        self.bounded(
            "list_workloads",
            self.inner.list_workloads(namespace, label_selector),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cluster::InMemoryClusterClient;

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let inner = InMemoryClusterClient::new()
            .with_latency(Duration::from_millis(200))
            .with_workload("ns", Workload::new("arena-foobar"));
        let client = DeadlineClusterClient::new(Arc::new(inner), Duration::from_millis(20));

        let err = client.get_workload("ns", "arena-foobar").await.unwrap_err();
        assert_eq!(
            err,
            ClusterError::Timeout {
                operation: "get_workload".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let inner = InMemoryClusterClient::new().with_workload("ns", Workload::new("arena-foobar"));
        let client = DeadlineClusterClient::new(Arc::new(inner), Duration::from_secs(1));

        let workload = client.get_workload("ns", "arena-foobar").await.unwrap();
        assert_eq!(workload.name(), "arena-foobar");
        assert!(client.get_workload("ns", "missing").await.unwrap_err().is_not_found());
    }
}
