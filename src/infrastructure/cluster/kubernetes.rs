//! Kubernetes-backed cluster client

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, PodSpec, PodTemplateSpec, Probe, Service,
    ServicePort, ServiceSpec as KubeServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

use crate::domain::{ClusterClient, ClusterError, ServiceSpec, Workload, WorkloadSpec};

const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";
const CONTAINER_NAME: &str = "instance";

/// Team instances as Deployments and Services in a Kubernetes cluster
#[derive(Clone)]
pub struct KubernetesClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubernetesClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesClusterClient").finish_non_exhaustive()
    }
}

impl KubernetesClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the in-cluster service account or the local kubeconfig
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::api("connect", e.to_string()))?;
        Ok(Self::new(client))
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_error(operation: &str, name: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound {
            name: name.to_string(),
        },
        kube::Error::Api(response) if response.code == 409 => ClusterError::AlreadyExists {
            name: name.to_string(),
        },
        other => ClusterError::api(operation, other.to_string()),
    }
}

fn to_workload(deployment: Deployment) -> Workload {
    let metadata = deployment.metadata;
    let ready_replicas = deployment
        .status
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);

    let mut workload = Workload::new(metadata.name.unwrap_or_default())
        .with_labels(metadata.labels.unwrap_or_default())
        .with_annotations(metadata.annotations.unwrap_or_default())
        .with_ready_replicas(ready_replicas);

    if let Some(created) = metadata.creation_timestamp {
        workload = workload.with_created_at(created.0);
    }

    workload
}

fn http_probe(spec: &WorkloadSpec, initial_delay_seconds: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(spec.health_path.clone()),
            port: IntOrString::Int(i32::from(spec.port)),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay_seconds),
        period_seconds: Some(5),
        ..Default::default()
    }
}

fn to_deployment(spec: &WorkloadSpec) -> Deployment {
    let env = spec
        .env
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect();

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(spec.image.clone()),
        ports: Some(vec![ContainerPort {
            container_port: i32::from(spec.port),
            ..Default::default()
        }]),
        env: Some(env),
        startup_probe: Some(Probe {
            failure_threshold: Some(30),
            ..http_probe(spec, 5)
        }),
        readiness_probe: Some(http_probe(spec, 5)),
        liveness_probe: Some(http_probe(spec, 30)),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            labels: Some(spec.labels.clone()),
            annotations: Some(spec.annotations.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(spec.selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(spec.labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn to_service(spec: &ServiceSpec) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            labels: Some(spec.labels.clone()),
            ..Default::default()
        },
        spec: Some(KubeServiceSpec {
            selector: Some(spec.selector.clone()),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: i32::from(spec.port),
                target_port: Some(IntOrString::Int(i32::from(spec.port))),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn label_query(label_selector: &BTreeMap<String, String>) -> String {
    label_selector
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl ClusterClient for KubernetesClusterClient {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.deployments(namespace)
            .get(name)
            .await
            .map(to_workload)
            .map_err(|e| map_error("get_workload", name, e))
    }

    async fn create_workload(
        &self,
        namespace: &str,
        spec: &WorkloadSpec,
    ) -> Result<Workload, ClusterError> {
        debug!(namespace = %namespace, name = %spec.name, "Creating deployment");

        self.deployments(namespace)
            .create(&PostParams::default(), &to_deployment(spec))
            .await
            .map(to_workload)
            .map_err(|e| map_error("create_workload", &spec.name, e))
    }

    async fn patch_workload_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Workload, ClusterError> {
        let patch = json!({ "metadata": { "annotations": annotations } });

        self.deployments(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(to_workload)
            .map_err(|e| map_error("patch_workload_annotations", name, e))
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.deployments(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_error("delete_workload", name, e))
    }

    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": { RESTARTED_AT_ANNOTATION: Utc::now().to_rfc3339() }
                    }
                }
            }
        });

        self.deployments(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(|e| map_error("restart_workload", name, e))
    }

    async fn create_service(&self, namespace: &str, spec: &ServiceSpec) -> Result<(), ClusterError> {
        debug!(namespace = %namespace, name = %spec.name, "Creating service");

        self.services(namespace)
            .create(&PostParams::default(), &to_service(spec))
            .await
            .map(|_| ())
            .map_err(|e| map_error("create_service", &spec.name, e))
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.services(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_error("delete_service", name, e))
    }

    async fn list_workloads(
        &self,
        namespace: &str,
        label_selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Workload>, ClusterError> {
        let params = ListParams::default().labels(&label_query(label_selector));

        self.deployments(namespace)
            .list(&params)
            .await
            .map(|list| list.items.into_iter().map(to_workload).collect())
            .map_err(|e| map_error("list_workloads", namespace, e))
    }
}
