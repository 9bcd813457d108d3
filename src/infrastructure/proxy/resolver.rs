//! Backend address resolution for team instances

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::TeamName;
use crate::infrastructure::cluster::InstanceTemplate;

/// Maps a team to the base URL its traffic is forwarded to
pub trait BackendUrlResolver: Send + Sync + Debug {
    fn resolve(&self, team: &TeamName) -> String;
}

/// Resolves to the team's in-cluster service address
#[derive(Debug, Clone)]
pub struct ServiceUrlResolver {
    template: Arc<InstanceTemplate>,
    namespace: String,
}

impl ServiceUrlResolver {
    pub fn new(template: Arc<InstanceTemplate>, namespace: impl Into<String>) -> Self {
        Self {
            template,
            namespace: namespace.into(),
        }
    }
}

impl BackendUrlResolver for ServiceUrlResolver {
    fn resolve(&self, team: &TeamName) -> String {
        self.template.service_url(team, &self.namespace)
    }
}

/// Sends every team to the same backend
#[derive(Debug, Clone)]
pub struct FixedUrlResolver(String);

impl FixedUrlResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}

impl BackendUrlResolver for FixedUrlResolver {
    fn resolve(&self, _team: &TeamName) -> String {
        self.0.clone()
    }
}
