//! Naming, labelling and annotation rules for team instances

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::domain::workload::{annotations, labels};
use crate::domain::{ServiceSpec, TeamName, WorkloadSpec};

/// Describes how every team instance is named, labelled and run
#[derive(Debug, Clone)]
pub struct InstanceTemplate {
    pub name_prefix: String,
    pub app_name: String,
    pub part_of: String,
    pub image: String,
    pub tag: String,
    pub port: u16,
    pub health_path: String,
    pub env: HashMap<String, String>,
}

impl Default for InstanceTemplate {
    fn default() -> Self {
        Self {
            name_prefix: "arena".to_string(),
            app_name: "arena-instance".to_string(),
            part_of: "arena-balancer".to_string(),
            image: "ghcr.io/arena/instance".to_string(),
            tag: "latest".to_string(),
            port: 3000,
            health_path: "/health".to_string(),
            env: HashMap::new(),
        }
    }
}

impl InstanceTemplate {
    /// Name shared by a team's workload and service
    pub fn workload_name(&self, team: &TeamName) -> String {
        format!("{}-{}", self.name_prefix, team)
    }

    /// Labels identifying every workload managed by this balancer
    pub fn owner_selector(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::NAME.to_string(), self.app_name.clone()),
            (labels::PART_OF.to_string(), self.part_of.clone()),
        ])
    }

    /// Labels selecting a single team's pods
    pub fn pod_selector(&self, team: &TeamName) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::TEAM.to_string(), team.to_string()),
            (labels::NAME.to_string(), self.app_name.clone()),
        ])
    }

    pub fn resource_labels(&self, team: &TeamName) -> BTreeMap<String, String> {
        let mut resource_labels = self.owner_selector();
        resource_labels.insert(labels::TEAM.to_string(), team.to_string());
        resource_labels.insert(labels::VERSION.to_string(), self.tag.clone());
        resource_labels.insert(labels::COMPONENT.to_string(), "team-instance".to_string());
        resource_labels.insert(
            labels::INSTANCE.to_string(),
            format!("{}-{}", self.app_name, team),
        );
        resource_labels
    }

    /// Metadata a brand new workload starts with
    pub fn initial_annotations(
        &self,
        passcode_hash: &str,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let mut initial = Self::last_request_annotations(now);
        initial.insert(annotations::PASSCODE.to_string(), passcode_hash.to_string());
        initial.insert(annotations::CHALLENGES_SOLVED.to_string(), "0".to_string());
        initial.insert(annotations::CHALLENGES.to_string(), "[]".to_string());
        initial
    }

    pub fn last_request_annotations(now: DateTime<Utc>) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                annotations::LAST_REQUEST.to_string(),
                now.timestamp_millis().to_string(),
            ),
            (annotations::LAST_REQUEST_READABLE.to_string(), now.to_rfc3339()),
        ])
    }

    pub fn passcode_annotations(passcode_hash: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(annotations::PASSCODE.to_string(), passcode_hash.to_string())])
    }

    pub fn workload_spec(
        &self,
        team: &TeamName,
        annotations: BTreeMap<String, String>,
    ) -> WorkloadSpec {
        let mut env: Vec<(String, String)> = self
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        env.sort();
        env.push(("TEAM".to_string(), team.to_string()));

        WorkloadSpec {
            name: self.workload_name(team),
            team: team.clone(),
            labels: self.resource_labels(team),
            annotations,
            selector: self.pod_selector(team),
            image: format!("{}:{}", self.image, self.tag),
            port: self.port,
            health_path: self.health_path.clone(),
            env,
        }
    }

    pub fn service_spec(&self, team: &TeamName) -> ServiceSpec {
        ServiceSpec {
            name: self.workload_name(team),
            labels: self.resource_labels(team),
            selector: self.pod_selector(team),
            port: self.port,
        }
    }

    /// In-cluster address of a team's service
    pub fn service_url(&self, team: &TeamName, namespace: &str) -> String {
        format!(
            "http://{}.{}.svc.cluster.local:{}",
            self.workload_name(team),
            namespace,
            self.port
        )
    }
}
