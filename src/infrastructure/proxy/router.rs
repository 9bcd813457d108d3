//! Request-time routing decisions for proxied traffic

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::domain::{ClusterClient, ClusterError, TeamName};
use crate::infrastructure::auth::SignedTokenCodec;
use crate::infrastructure::cache::InstanceReadinessCache;
use crate::infrastructure::cluster::InstanceTemplate;
use crate::infrastructure::settings::SettingsStore;

/// Why a session holder is sent back to the entry page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    BalancerDisabled,
    InstanceNotFound,
    InstanceRestarting,
}

impl RedirectReason {
    /// Machine-readable code carried in the redirect
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalancerDisabled => "balancer-disabled",
            Self::InstanceNotFound => "instance-not-found",
            Self::InstanceRestarting => "instance-restarting",
        }
    }
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing a single request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// No session, or one that does not verify
    RedirectToEntry,
    Redirect {
        reason: RedirectReason,
        team: TeamName,
    },
    Forward { team: TeamName },
    /// The cluster could not be asked; nothing was cached
    Failed { team: TeamName },
}

/// Decides where a request goes based on its session cookie
#[derive(Debug, Clone)]
pub struct ProxyRouter {
    tokens: Arc<SignedTokenCodec>,
    settings: Arc<SettingsStore>,
    cache: Arc<InstanceReadinessCache>,
    cluster: Arc<dyn ClusterClient>,
    template: Arc<InstanceTemplate>,
    namespace: String,
    last_request_patch_timeout: Duration,
}

impl ProxyRouter {
    pub fn new(
        tokens: Arc<SignedTokenCodec>,
        settings: Arc<SettingsStore>,
        cache: Arc<InstanceReadinessCache>,
        cluster: Arc<dyn ClusterClient>,
        template: Arc<InstanceTemplate>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            settings,
            cache,
            cluster,
            template,
            namespace: namespace.into(),
            last_request_patch_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_last_request_patch_timeout(mut self, timeout: Duration) -> Self {
        self.last_request_patch_timeout = timeout;
        self
    }

    pub async fn route(&self, session_token: Option<&str>) -> RouteDecision {
        let Some(team) = self.authenticate(session_token) else {
            return RouteDecision::RedirectToEntry;
        };

        if !self.settings.balancer_enabled() {
            return RouteDecision::Redirect {
                reason: RedirectReason::BalancerDisabled,
                team,
            };
        }

        if self.cache.get(&team).await == Some(true) {
            return RouteDecision::Forward { team };
        }

        let name = self.template.workload_name(&team);

        match self.cluster.get_workload(&self.namespace, &name).await {
            Ok(workload) if workload.is_ready() => {
                self.cache.put(&team, true).await;
                self.touch_last_request(&team, name);
                RouteDecision::Forward { team }
            }
            Ok(_) => {
                self.cache.put(&team, false).await;
                RouteDecision::Redirect {
                    reason: RedirectReason::InstanceRestarting,
                    team,
                }
            }
            Err(ClusterError::NotFound { .. }) => RouteDecision::Redirect {
                reason: RedirectReason::InstanceNotFound,
                team,
            },
            Err(e) => {
                error!(team = %team, error = %e, "Failed to check instance readiness");
                RouteDecision::Failed { team }
            }
        }
    }

    fn authenticate(&self, session_token: Option<&str>) -> Option<TeamName> {
        let identity = self.tokens.verify(session_token?)?;

        match TeamName::new(identity) {
            Ok(team) => Some(team),
            Err(e) => {
                warn!(error = %e, "Signed session carries an invalid team name");
                None
            }
        }
    }

    /// Record the request time on the workload without holding up the response
    fn touch_last_request(&self, team: &TeamName, name: String) {
        let cluster = self.cluster.clone();
        let namespace = self.namespace.clone();
        let timeout = self.last_request_patch_timeout;
        let team = team.clone();

        tokio::spawn(async move {
            let annotations = InstanceTemplate::last_request_annotations(Utc::now());
            let patch = cluster.patch_workload_annotations(&namespace, &name, &annotations);

            match tokio::time::timeout(timeout, patch).await {
                Ok(Ok(_)) => debug!(team = %team, "Updated last request timestamp"),
                Ok(Err(e)) => {
                    error!(team = %team, error = %e, "Failed to update last request timestamp")
                }
                Err(_) => error!(team = %team, "Timed out updating last request timestamp"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workload::annotations;
    use crate::domain::{Setting, Workload};
    use crate::infrastructure::cluster::{DeadlineClusterClient, InMemoryClusterClient};
    use crate::test_support;

    const NS: &str = "test-namespace";

    struct Fixture {
        cluster: Arc<InMemoryClusterClient>,
        settings: Arc<SettingsStore>,
        cache: Arc<InstanceReadinessCache>,
        router: ProxyRouter,
    }

    fn fixture(cluster: InMemoryClusterClient) -> Fixture {
        let cluster = Arc::new(cluster);
        let settings = Arc::new(SettingsStore::default());
        let cache = Arc::new(InstanceReadinessCache::new());
        let router = ProxyRouter::new(
            Arc::new(test_support::token_codec()),
            settings.clone(),
            cache.clone(),
            cluster.clone(),
            Arc::new(InstanceTemplate::default()),
            NS,
        );

        Fixture {
            cluster,
            settings,
            cache,
            router,
        }
    }

    fn workload(ready_replicas: i32) -> Workload {
        Workload::new("arena-foobar")
            .with_annotation(annotations::LAST_REQUEST, "1000")
            .with_ready_replicas(ready_replicas)
    }

    fn team() -> TeamName {
        TeamName::new("foobar").unwrap()
    }

    fn cookie() -> String {
        test_support::token_codec().sign("foobar").unwrap()
    }

    #[tokio::test]
    async fn test_missing_and_forged_sessions_redirect_to_entry() {
        let f = fixture(InMemoryClusterClient::new());
        let forged = SignedTokenCodec::new("another-key").sign("foobar").unwrap();

        assert_eq!(f.router.route(None).await, RouteDecision::RedirectToEntry);
        assert_eq!(f.router.route(Some(&forged)).await, RouteDecision::RedirectToEntry);
        assert_eq!(f.router.route(Some("garbage")).await, RouteDecision::RedirectToEntry);
        assert_eq!(f.cluster.call_count("get_workload"), 0);
    }

    #[tokio::test]
    async fn test_disabled_balancer_redirects() {
        let f = fixture(InMemoryClusterClient::new().with_workload(NS, workload(1)));
        f.settings.set(Setting::BalancerEnabled, false);

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Redirect {
                reason: RedirectReason::BalancerDisabled,
                team: team(),
            }
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_cluster() {
        let f = fixture(InMemoryClusterClient::new());
        f.cache.put(&team(), true).await;

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Forward { team: team() }
        );
        assert_eq!(f.cluster.call_count("get_workload"), 0);
    }

    #[tokio::test]
    async fn test_missing_instance_is_not_cached() {
        let f = fixture(InMemoryClusterClient::new());

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Redirect {
                reason: RedirectReason::InstanceNotFound,
                team: team(),
            }
        );
        assert_eq!(f.cache.get(&team()).await, None);
    }

    #[tokio::test]
    async fn test_unready_instance_is_cached_as_not_ready() {
        let f = fixture(InMemoryClusterClient::new().with_workload(NS, workload(0)));

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Redirect {
                reason: RedirectReason::InstanceRestarting,
                team: team(),
            }
        );
        assert_eq!(f.cache.get(&team()).await, Some(false));

        // a not-ready entry does not short-circuit the next lookup
        f.cluster.set_ready_replicas(NS, "arena-foobar", 1);
        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Forward { team: team() }
        );
        assert_eq!(f.cluster.call_count("get_workload"), 2);
    }

    #[tokio::test]
    async fn test_ready_instance_forwards_and_touches_last_request() {
        let f = fixture(InMemoryClusterClient::new().with_workload(NS, workload(1)));

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Forward { team: team() }
        );
        assert_eq!(f.cache.get(&team()).await, Some(true));

        let mut last_request = 1000;
        for _ in 0..50 {
            last_request = f
                .cluster
                .workload(NS, "arena-foobar")
                .and_then(|w| w.last_request_millis())
                .unwrap_or(0);
            if last_request > 1000 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(last_request > 1000);
    }

    #[tokio::test]
    async fn test_failed_patch_does_not_affect_routing() {
        let f = fixture(InMemoryClusterClient::new().with_workload(NS, workload(1)));
        f.cluster.fail_operation("patch_workload_annotations");

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Forward { team: team() }
        );
    }

    #[tokio::test]
    async fn test_cluster_failure_is_not_not_found() {
        let f = fixture(InMemoryClusterClient::new().with_workload(NS, workload(1)));
        f.cluster.fail_operation("get_workload");

        assert_eq!(
            f.router.route(Some(&cookie())).await,
            RouteDecision::Failed { team: team() }
        );
        assert_eq!(f.cache.get(&team()).await, None);
    }

    #[tokio::test]
    async fn test_cluster_timeout_is_failure_and_not_cached() {
        let slow = InMemoryClusterClient::new()
            .with_workload(NS, workload(1))
            .with_latency(Duration::from_millis(200));
        let cluster = Arc::new(DeadlineClusterClient::new(
            Arc::new(slow),
            Duration::from_millis(20),
        ));
        let cache = Arc::new(InstanceReadinessCache::new());
        let router = ProxyRouter::new(
            Arc::new(test_support::token_codec()),
            Arc::new(SettingsStore::default()),
            cache.clone(),
            cluster,
            Arc::new(InstanceTemplate::default()),
            NS,
        );

        assert_eq!(
            router.route(Some(&cookie())).await,
            RouteDecision::Failed { team: team() }
        );
        assert_eq!(cache.get(&team()).await, None);
    }
}
