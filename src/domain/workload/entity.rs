//! Workload and service types exchanged with the cluster

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::team::TeamName;

/// Metadata annotation keys stored on a team's workload
pub mod annotations {
    pub const PASSCODE: &str = "arena-balancer/passcode";
    pub const LAST_REQUEST: &str = "arena-balancer/lastRequest";
    pub const LAST_REQUEST_READABLE: &str = "arena-balancer/lastRequestReadable";
    pub const CHALLENGES_SOLVED: &str = "arena-balancer/challengesSolved";
    pub const CHALLENGES: &str = "arena-balancer/challenges";
}

/// Label keys stored on a team's workload and service
pub mod labels {
    pub const TEAM: &str = "team";
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const PART_OF: &str = "app.kubernetes.io/part-of";
    pub const INSTANCE: &str = "app.kubernetes.io/instance";
    pub const VERSION: &str = "app.kubernetes.io/version";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
}

/// A team's running instance as observed in the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    name: String,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    ready_replicas: i32,
    created_at: Option<DateTime<Utc>>,
}

impl Workload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            ready_replicas: 0,
            created_at: None,
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_ready_replicas(mut self, ready_replicas: i32) -> Self {
        self.ready_replicas = ready_replicas;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn ready_replicas(&self) -> i32 {
        self.ready_replicas
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// At least one replica can serve traffic
    pub fn is_ready(&self) -> bool {
        self.ready_replicas > 0
    }

    /// Team label, if present
    pub fn team(&self) -> Option<&str> {
        self.labels.get(labels::TEAM).map(String::as_str)
    }

    /// Stored passcode hash; empty values count as absent
    pub fn passcode_hash(&self) -> Option<&str> {
        self.annotation(annotations::PASSCODE)
            .filter(|hash| !hash.is_empty())
    }

    /// Last proxied request in unix millis
    pub fn last_request_millis(&self) -> Option<i64> {
        self.annotation(annotations::LAST_REQUEST)
            .and_then(|value| value.parse().ok())
    }

    pub fn challenges_solved(&self) -> u32 {
        self.annotation(annotations::CHALLENGES_SOLVED)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.annotations
    }

    pub(crate) fn set_ready_replicas(&mut self, ready_replicas: i32) {
        self.ready_replicas = ready_replicas;
    }
}

/// Everything needed to create a team's workload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,
    pub team: TeamName,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Pod labels the workload selects on
    pub selector: BTreeMap<String, String>,
    pub image: String,
    pub port: u16,
    pub health_path: String,
    pub env: Vec<(String, String)>,
}

/// The network-exposing service in front of a team's workload
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub port: u16,
}
