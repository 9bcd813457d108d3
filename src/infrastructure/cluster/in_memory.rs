//! In-memory cluster, for local development and tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{ClusterClient, ClusterError, ServiceSpec, Workload, WorkloadSpec};

type ResourceKey = (String, String);

fn key(namespace: &str, name: &str) -> ResourceKey {
    (namespace.to_string(), name.to_string())
}

/// Thread-safe stand-in for the cluster control plane.
///
/// Records how often each operation is called and can be told to fail
/// specific operations or to respond slowly.
#[derive(Debug, Default)]
pub struct InMemoryClusterClient {
    workloads: RwLock<HashMap<ResourceKey, Workload>>,
    services: RwLock<HashMap<ResourceKey, ServiceSpec>>,
    calls: RwLock<HashMap<&'static str, usize>>,
    failing: RwLock<HashSet<&'static str>>,
    latency: Option<Duration>,
    ready_on_create: bool,
}

impl InMemoryClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newly created workloads report one ready replica immediately
    pub fn with_ready_on_create(mut self) -> Self {
        self.ready_on_create = true;
        self
    }

    /// Delay every call by the given duration
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_workload(self, namespace: &str, workload: Workload) -> Self {
        self.insert_workload(namespace, workload);
        self
    }

    pub fn insert_workload(&self, namespace: &str, workload: Workload) {
        let mut workloads = self.workloads.write().unwrap_or_else(|e| e.into_inner());
        workloads.insert(key(namespace, workload.name()), workload);
    }

    /// Current state of a workload, bypassing call accounting
    pub fn workload(&self, namespace: &str, name: &str) -> Option<Workload> {
        let workloads = self.workloads.read().unwrap_or_else(|e| e.into_inner());
        workloads.get(&key(namespace, name)).cloned()
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<ServiceSpec> {
        let services = self.services.read().unwrap_or_else(|e| e.into_inner());
        services.get(&key(namespace, name)).cloned()
    }

    pub fn workload_count(&self) -> usize {
        self.workloads.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn service_count(&self) -> usize {
        self.services.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn set_ready_replicas(&self, namespace: &str, name: &str, ready_replicas: i32) {
        let mut workloads = self.workloads.write().unwrap_or_else(|e| e.into_inner());

        if let Some(workload) = workloads.get_mut(&key(namespace, name)) {
            workload.set_ready_replicas(ready_replicas);
        }
    }

    /// Make every subsequent call of `operation` fail with an API error
    pub fn fail_operation(&self, operation: &'static str) {
        let mut failing = self.failing.write().unwrap_or_else(|e| e.into_inner());
        failing.insert(operation);
    }

    /// Number of times `operation` was called
    pub fn call_count(&self, operation: &str) -> usize {
        let calls = self.calls.read().unwrap_or_else(|e| e.into_inner());
        calls.get(operation).copied().unwrap_or(0)
    }

    async fn enter(&self, operation: &'static str) -> Result<(), ClusterError> {
        {
            let mut calls = self
                .calls
                .write()
                .map_err(|e| ClusterError::api(operation, format!("lock poisoned: {}", e)))?;
            *calls.entry(operation).or_insert(0) += 1;
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failing = self
            .failing
            .read()
            .map_err(|e| ClusterError::api(operation, format!("lock poisoned: {}", e)))?;

        if failing.contains(operation) {
            return Err(ClusterError::api(operation, "injected failure"));
        }

        Ok(())
    }

    fn poisoned(operation: &str, message: impl std::fmt::Display) -> ClusterError {
        ClusterError::api(operation, format!("lock poisoned: {}", message))
    }
}

#[async_trait]
impl ClusterClient for InMemoryClusterClient {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.enter("get_workload").await?;

        let workloads = self
            .workloads
            .read()
            .map_err(|e| Self::poisoned("get_workload", e))?;

        workloads
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                name: name.to_string(),
            })
    }

    async fn create_workload(
        &self,
        namespace: &str,
        spec: &WorkloadSpec,
    ) -> Result<Workload, ClusterError> {
        self.enter("create_workload").await?;

        let mut workloads = self
            .workloads
            .write()
            .map_err(|e| Self::poisoned("create_workload", e))?;
        let resource_key = key(namespace, &spec.name);

        if workloads.contains_key(&resource_key) {
            return Err(ClusterError::AlreadyExists {
                name: spec.name.clone(),
            });
        }

        let workload = Workload::new(&spec.name)
            .with_labels(spec.labels.clone())
            .with_annotations(spec.annotations.clone())
            .with_ready_replicas(if self.ready_on_create { 1 } else { 0 })
            .with_created_at(Utc::now());

        workloads.insert(resource_key, workload.clone());
        Ok(workload)
    }

    async fn patch_workload_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Workload, ClusterError> {
        self.enter("patch_workload_annotations").await?;

        let mut workloads = self
            .workloads
            .write()
            .map_err(|e| Self::poisoned("patch_workload_annotations", e))?;

        let workload = workloads
            .get_mut(&key(namespace, name))
            .ok_or_else(|| ClusterError::NotFound {
                name: name.to_string(),
            })?;

        for (annotation, value) in annotations {
            workload
                .annotations_mut()
                .insert(annotation.clone(), value.clone());
        }

        Ok(workload.clone())
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.enter("delete_workload").await?;

        let mut workloads = self
            .workloads
            .write()
            .map_err(|e| Self::poisoned("delete_workload", e))?;

        workloads
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound {
                name: name.to_string(),
            })
    }

    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.enter("restart_workload").await?;

        let mut workloads = self
            .workloads
            .write()
            .map_err(|e| Self::poisoned("restart_workload", e))?;

        let workload = workloads
            .get_mut(&key(namespace, name))
            .ok_or_else(|| ClusterError::NotFound {
                name: name.to_string(),
            })?;

        workload.set_ready_replicas(0);
        Ok(())
    }

    async fn create_service(&self, namespace: &str, spec: &ServiceSpec) -> Result<(), ClusterError> {
        self.enter("create_service").await?;

        let mut services = self
            .services
            .write()
            .map_err(|e| Self::poisoned("create_service", e))?;
        let resource_key = key(namespace, &spec.name);

        if services.contains_key(&resource_key) {
            return Err(ClusterError::AlreadyExists {
                name: spec.name.clone(),
            });
        }

        services.insert(resource_key, spec.clone());
        Ok(())
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.enter("delete_service").await?;

        let mut services = self
            .services
            .write()
            .map_err(|e| Self::poisoned("delete_service", e))?;

        services
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound {
                name: name.to_string(),
            })
    }

    async fn list_workloads(
        &self,
        namespace: &str,
        label_selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Workload>, ClusterError> {
        self.enter("list_workloads").await?;

        let workloads = self
            .workloads
            .read()
            .map_err(|e| Self::poisoned("list_workloads", e))?;

        let mut matching: Vec<Workload> = workloads
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, workload)| workload)
            .filter(|workload| {
                label_selector
                    .iter()
                    .all(|(label, value)| workload.labels().get(label) == Some(value))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));

        Ok(matching)
    }
}
