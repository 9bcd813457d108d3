//! Team lifecycle: create-or-join, passcode reset and instance administration

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::domain::{ClusterClient, ClusterError, DomainError, TeamName, Workload};
use crate::infrastructure::auth::{secret_matches, PasscodeAuthenticator, SignedTokenCodec};
use crate::infrastructure::cache::InstanceReadinessCache;
use crate::infrastructure::cluster::InstanceTemplate;

const INVALID_PASSCODE: &str = "Invalid passcode";

/// Settings of the lifecycle manager that do not change at runtime
#[derive(Debug, Clone)]
pub struct TeamLifecycleConfig {
    pub namespace: String,
    pub max_instances: usize,
    /// Password of the `admin` identity; empty disables the admin login
    pub admin_password: String,
}

impl Default for TeamLifecycleConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            max_instances: 100,
            admin_password: String::new(),
        }
    }
}

/// Result of a successful join
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// A new instance was created; the plaintext passcode is disclosed only here
    Created {
        team: TeamName,
        passcode: String,
        token: String,
    },
    /// An existing team was joined with its passcode
    Joined { team: TeamName, token: String },
    /// Signed in as the admin identity
    Admin { token: String },
}

impl JoinOutcome {
    /// Session token to hand out as the cookie value
    pub fn token(&self) -> &str {
        match self {
            Self::Created { token, .. } | Self::Joined { token, .. } | Self::Admin { token } => {
                token
            }
        }
    }
}

/// State of one team instance as seen by an admin
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSummary {
    pub team: String,
    pub name: String,
    pub ready: bool,
    /// Unix millis, 0 when unknown
    pub created_at: i64,
    /// Unix millis of the last proxied request, 0 when unknown
    pub last_connect: i64,
    pub challenges_solved: u32,
}

impl InstanceSummary {
    fn from_workload(workload: &Workload) -> Option<Self> {
        let team = workload.team()?.to_string();

        Some(Self {
            team,
            name: workload.name().to_string(),
            ready: workload.is_ready(),
            created_at: workload
                .created_at()
                .map(|created| created.timestamp_millis())
                .unwrap_or(0),
            last_connect: workload.last_request_millis().unwrap_or(0),
            challenges_solved: workload.challenges_solved(),
        })
    }
}

/// Creates, joins, resets and administers per-team workloads
#[derive(Debug, Clone)]
pub struct TeamLifecycleManager {
    cluster: Arc<dyn ClusterClient>,
    template: Arc<InstanceTemplate>,
    passcodes: Arc<PasscodeAuthenticator>,
    tokens: Arc<SignedTokenCodec>,
    cache: Arc<InstanceReadinessCache>,
    config: TeamLifecycleConfig,
}

impl TeamLifecycleManager {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        template: Arc<InstanceTemplate>,
        passcodes: Arc<PasscodeAuthenticator>,
        tokens: Arc<SignedTokenCodec>,
        cache: Arc<InstanceReadinessCache>,
        config: TeamLifecycleConfig,
    ) -> Self {
        Self {
            cluster,
            template,
            passcodes,
            tokens,
            cache,
            config,
        }
    }

    /// Join a team, creating its instance when it does not exist yet.
    ///
    /// Every authentication failure yields the same unauthorized error,
    /// whether the passcode was missing or wrong.
    pub async fn join(
        &self,
        team: &str,
        passcode: Option<&str>,
    ) -> Result<JoinOutcome, DomainError> {
        let team = TeamName::new(team).map_err(|e| DomainError::validation(e.to_string()))?;

        if team.is_admin() {
            return self.join_as_admin(passcode);
        }

        let name = self.template.workload_name(&team);

        match self.cluster.get_workload(&self.config.namespace, &name).await {
            Ok(workload) => self.join_existing(team, &workload, passcode),
            Err(ClusterError::NotFound { .. }) => self.create(team).await,
            Err(e) => {
                error!(team = %team, error = %e, "Failed to look up team instance");
                Err(e.into())
            }
        }
    }

    fn join_as_admin(&self, passcode: Option<&str>) -> Result<JoinOutcome, DomainError> {
        let authorized = !self.config.admin_password.is_empty()
            && passcode
                .map(|candidate| secret_matches(&self.config.admin_password, candidate))
                .unwrap_or(false);

        if !authorized {
            warn!("Rejected admin login");
            return Err(DomainError::unauthorized(INVALID_PASSCODE));
        }

        info!("Admin signed in");
        let token = self.tokens.sign(TeamName::ADMIN)?;
        Ok(JoinOutcome::Admin { token })
    }

    fn join_existing(
        &self,
        team: TeamName,
        workload: &Workload,
        passcode: Option<&str>,
    ) -> Result<JoinOutcome, DomainError> {
        let authorized = match (workload.passcode_hash(), passcode) {
            (Some(hash), Some(candidate)) => self.passcodes.verify(hash, candidate),
            _ => false,
        };

        if !authorized {
            debug!(team = %team, "Rejected join of existing team");
            return Err(DomainError::unauthorized(INVALID_PASSCODE));
        }

        info!(team = %team, "Team joined");
        let token = self.tokens.sign(team.as_str())?;
        Ok(JoinOutcome::Joined { team, token })
    }

    async fn create(&self, team: TeamName) -> Result<JoinOutcome, DomainError> {
        let namespace = &self.config.namespace;

        let existing = self
            .cluster
            .list_workloads(namespace, &self.template.owner_selector())
            .await
            .map_err(|e| {
                error!(team = %team, error = %e, "Failed to count team instances");
                DomainError::from(e)
            })?;

        if existing.len() >= self.config.max_instances {
            warn!(team = %team, count = existing.len(), "Instance limit reached");
            return Err(DomainError::capacity("Reached maximum instance count"));
        }

        let issued = self.passcodes.issue()?;
        let annotations = self.template.initial_annotations(&issued.hash, Utc::now());
        let workload = self.template.workload_spec(&team, annotations);

        info!(team = %team, name = %workload.name, "Creating team instance");

        self.cluster
            .create_workload(namespace, &workload)
            .await
            .map_err(|e| {
                error!(team = %team, error = %e, "Failed to create workload");
                DomainError::from(e)
            })?;

        // The workload stays in place when the service cannot be created
        self.cluster
            .create_service(namespace, &self.template.service_spec(&team))
            .await
            .map_err(|e| {
                error!(team = %team, error = %e, "Failed to create service");
                DomainError::from(e)
            })?;

        let token = self.tokens.sign(team.as_str())?;

        Ok(JoinOutcome::Created {
            team,
            passcode: issued.plaintext,
            token,
        })
    }

    /// Replace the team's passcode, returning the new plaintext once
    pub async fn reset_passcode(&self, team: &TeamName) -> Result<String, DomainError> {
        let namespace = &self.config.namespace;
        let name = self.template.workload_name(team);

        self.cluster.get_workload(namespace, &name).await.map_err(|e| {
            if !e.is_not_found() {
                error!(team = %team, error = %e, "Failed to look up team instance");
            }
            DomainError::from(e)
        })?;

        let issued = self.passcodes.issue()?;

        self.cluster
            .patch_workload_annotations(
                namespace,
                &name,
                &InstanceTemplate::passcode_annotations(&issued.hash),
            )
            .await
            .map_err(|e| {
                error!(team = %team, error = %e, "Failed to store new passcode");
                DomainError::cluster("patch_workload_annotations", e.to_string())
            })?;

        info!(team = %team, "Passcode reset");
        Ok(issued.plaintext)
    }

    /// All team instances owned by this balancer, sorted by team
    pub async fn list_instances(&self) -> Result<Vec<InstanceSummary>, DomainError> {
        let workloads = self
            .cluster
            .list_workloads(&self.config.namespace, &self.template.owner_selector())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list team instances");
                DomainError::from(e)
            })?;

        let mut instances: Vec<InstanceSummary> = workloads
            .iter()
            .filter_map(InstanceSummary::from_workload)
            .collect();
        instances.sort_by(|a, b| a.team.cmp(&b.team));

        Ok(instances)
    }

    /// Remove the team's workload and service
    pub async fn delete(&self, team: &TeamName) -> Result<(), DomainError> {
        let namespace = &self.config.namespace;
        let name = self.template.workload_name(team);

        info!(team = %team, "Deleting team instance");

        let result = self.cluster.delete_workload(namespace, &name).await;
        self.cache.invalidate(team).await;
        result.map_err(|e| {
            if !e.is_not_found() {
                error!(team = %team, error = %e, "Failed to delete workload");
            }
            DomainError::from(e)
        })?;

        match self.cluster.delete_service(namespace, &name).await {
            Ok(()) => Ok(()),
            Err(ClusterError::NotFound { .. }) => {
                warn!(team = %team, "Service was already gone");
                Ok(())
            }
            Err(e) => {
                error!(team = %team, error = %e, "Failed to delete service");
                Err(e.into())
            }
        }
    }

    /// Restart the team's workload, keeping its passcode and progress
    pub async fn restart(&self, team: &TeamName) -> Result<(), DomainError> {
        let name = self.template.workload_name(team);

        info!(team = %team, "Restarting team instance");

        let result = self
            .cluster
            .restart_workload(&self.config.namespace, &name)
            .await;
        self.cache.invalidate(team).await;

        result.map_err(|e| {
            if !e.is_not_found() {
                error!(team = %team, error = %e, "Failed to restart workload");
            }
            DomainError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::workload::annotations;
    use crate::infrastructure::cluster::InMemoryClusterClient;
    use crate::test_support;

    const NS: &str = "test-namespace";

    struct Fixture {
        cluster: Arc<InMemoryClusterClient>,
        cache: Arc<InstanceReadinessCache>,
        manager: TeamLifecycleManager,
    }

    fn fixture_with(cluster: InMemoryClusterClient, config: TeamLifecycleConfig) -> Fixture {
        let cluster = Arc::new(cluster);
        let cache = Arc::new(InstanceReadinessCache::new());
        let manager = TeamLifecycleManager::new(
            cluster.clone(),
            Arc::new(InstanceTemplate::default()),
            Arc::new(test_support::passcode_authenticator()),
            Arc::new(test_support::token_codec()),
            cache.clone(),
            config,
        );

        Fixture {
            cluster,
            cache,
            manager,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            InMemoryClusterClient::new(),
            TeamLifecycleConfig {
                namespace: NS.to_string(),
                max_instances: 10,
                admin_password: "admin-password".to_string(),
            },
        )
    }

    fn team(name: &str) -> TeamName {
        TeamName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_join_creates_workload_and_service() {
        let f = fixture();

        let outcome = f.manager.join("foobar", None).await.unwrap();

        let JoinOutcome::Created { team, passcode, token } = outcome else {
            panic!("expected a new team");
        };
        assert_eq!(team.as_str(), "foobar");
        assert_eq!(passcode, test_support::PASSCODE);
        assert_eq!(test_support::token_codec().verify(&token), Some("foobar".to_string()));

        assert_eq!(f.cluster.call_count("create_workload"), 1);
        assert_eq!(f.cluster.call_count("create_service"), 1);

        let workload = f.cluster.workload(NS, "arena-foobar").unwrap();
        let hash = workload.passcode_hash().unwrap();
        assert_ne!(hash, test_support::PASSCODE);
        assert!(test_support::passcode_authenticator().verify(hash, test_support::PASSCODE));
        assert_eq!(workload.annotation(annotations::CHALLENGES_SOLVED), Some("0"));
        assert!(f.cluster.service(NS, "arena-foobar").is_some());
    }

    #[tokio::test]
    async fn test_join_existing_with_passcode() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();

        let outcome = f
            .manager
            .join("foobar", Some(test_support::PASSCODE))
            .await
            .unwrap();

        assert!(matches!(outcome, JoinOutcome::Joined { .. }));
        assert_eq!(f.cluster.call_count("create_workload"), 1);
    }

    #[tokio::test]
    async fn test_join_existing_rejections_are_identical() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();
        let hash_before = f
            .cluster
            .workload(NS, "arena-foobar")
            .unwrap()
            .passcode_hash()
            .map(str::to_string);

        let missing = f.manager.join("foobar", None).await.unwrap_err();
        let wrong = f.manager.join("foobar", Some("WRONG123")).await.unwrap_err();

        assert!(matches!(missing, DomainError::Unauthorized { .. }));
        assert_eq!(missing.to_string(), wrong.to_string());

        let hash_after = f
            .cluster
            .workload(NS, "arena-foobar")
            .unwrap()
            .passcode_hash()
            .map(str::to_string);
        assert_eq!(hash_before, hash_after);
        assert_eq!(f.cluster.call_count("create_workload"), 1);
    }

    #[tokio::test]
    async fn test_join_rejects_invalid_team_name_before_cluster_call() {
        let f = fixture();

        let err = f.manager.join("Not A Team", None).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(f.cluster.call_count("get_workload"), 0);
    }

    #[tokio::test]
    async fn test_join_lookup_failure_is_not_creation() {
        let f = fixture();
        f.cluster.fail_operation("get_workload");

        let err = f.manager.join("foobar", None).await.unwrap_err();

        assert!(matches!(err, DomainError::Cluster { .. }));
        assert_eq!(f.cluster.call_count("create_workload"), 0);
    }

    #[tokio::test]
    async fn test_join_respects_instance_cap() {
        let f = fixture_with(
            InMemoryClusterClient::new(),
            TeamLifecycleConfig {
                namespace: NS.to_string(),
                max_instances: 1,
                admin_password: String::new(),
            },
        );
        f.manager.join("first", None).await.unwrap();

        let err = f.manager.join("second", None).await.unwrap_err();

        assert!(matches!(err, DomainError::Capacity { .. }));
        assert_eq!(f.cluster.workload_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_joins_conflict() {
        let f = fixture_with(
            InMemoryClusterClient::new().with_latency(Duration::from_millis(20)),
            TeamLifecycleConfig {
                namespace: NS.to_string(),
                max_instances: 10,
                admin_password: String::new(),
            },
        );

        let (first, second) =
            tokio::join!(f.manager.join("foobar", None), f.manager.join("foobar", None));

        let outcomes = [first, second];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, Ok(JoinOutcome::Created { .. })))
                .count(),
            1
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, Err(DomainError::Conflict { .. })))
                .count(),
            1
        );
        assert_eq!(f.cluster.workload_count(), 1);
    }

    #[tokio::test]
    async fn test_service_failure_leaves_workload() {
        let f = fixture();
        f.cluster.fail_operation("create_service");

        let err = f.manager.join("foobar", None).await.unwrap_err();

        assert!(matches!(err, DomainError::Cluster { .. }));
        assert!(f.cluster.workload(NS, "arena-foobar").is_some());
    }

    #[tokio::test]
    async fn test_admin_join() {
        let f = fixture();

        let outcome = f.manager.join("admin", Some("admin-password")).await.unwrap();
        assert!(matches!(outcome, JoinOutcome::Admin { .. }));
        assert_eq!(
            test_support::token_codec().verify(outcome.token()),
            Some("admin".to_string())
        );

        let err = f.manager.join("admin", Some("guess")).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
        assert_eq!(f.cluster.call_count("get_workload"), 0);
        assert_eq!(f.cluster.workload_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_join_disabled_without_password() {
        let f = fixture_with(InMemoryClusterClient::new(), TeamLifecycleConfig::default());

        let err = f.manager.join("admin", Some("")).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_reset_passcode_only_touches_passcode() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();
        let before = f.cluster.workload(NS, "arena-foobar").unwrap();

        let passcode = f.manager.reset_passcode(&team("foobar")).await.unwrap();

        let after = f.cluster.workload(NS, "arena-foobar").unwrap();
        assert_eq!(passcode, test_support::PASSCODE);
        assert_ne!(before.passcode_hash(), after.passcode_hash());
        assert_eq!(
            before.annotation(annotations::LAST_REQUEST),
            after.annotation(annotations::LAST_REQUEST)
        );
        assert_eq!(before.labels(), after.labels());
    }

    #[tokio::test]
    async fn test_reset_passcode_missing_workload() {
        let f = fixture();

        let err = f.manager.reset_passcode(&team("foobar")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reset_passcode_patch_failure_keeps_old_hash() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();
        let before = f.cluster.workload(NS, "arena-foobar").unwrap();
        f.cluster.fail_operation("patch_workload_annotations");

        let err = f.manager.reset_passcode(&team("foobar")).await.unwrap_err();

        assert!(matches!(err, DomainError::Cluster { .. }));
        let after = f.cluster.workload(NS, "arena-foobar").unwrap();
        assert_eq!(before.passcode_hash(), after.passcode_hash());
    }

    #[tokio::test]
    async fn test_list_instances_sorted_by_team() {
        let f = fixture();
        f.manager.join("zeta", None).await.unwrap();
        f.manager.join("alpha", None).await.unwrap();
        f.cluster.set_ready_replicas(NS, "arena-zeta", 1);

        let instances = f.manager.list_instances().await.unwrap();

        let teams: Vec<&str> = instances.iter().map(|i| i.team.as_str()).collect();
        assert_eq!(teams, vec!["alpha", "zeta"]);
        assert!(!instances[0].ready);
        assert!(instances[1].ready);
        assert!(instances[1].created_at > 0);
        assert!(instances[1].last_connect > 0);
        assert_eq!(instances[1].challenges_solved, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_everything_and_invalidates_cache() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();
        f.cache.put(&team("foobar"), true).await;

        f.manager.delete(&team("foobar")).await.unwrap();

        assert_eq!(f.cluster.workload_count(), 0);
        assert_eq!(f.cluster.service_count(), 0);
        assert_eq!(f.cache.get(&team("foobar")).await, None);
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_service() {
        let f = fixture();
        f.manager.join("foobar", None).await.unwrap();
        f.cluster.delete_service(NS, "arena-foobar").await.unwrap();

        f.manager.delete(&team("foobar")).await.unwrap();
        assert_eq!(f.cluster.workload_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_workload() {
        let f = fixture();

        let err = f.manager.delete(&team("foobar")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_restart_keeps_metadata() {
        let f = fixture_with(
            InMemoryClusterClient::new().with_ready_on_create(),
            TeamLifecycleConfig {
                namespace: NS.to_string(),
                ..Default::default()
            },
        );
        f.manager.join("foobar", None).await.unwrap();
        f.cache.put(&team("foobar"), true).await;
        let before = f.cluster.workload(NS, "arena-foobar").unwrap();

        f.manager.restart(&team("foobar")).await.unwrap();

        let after = f.cluster.workload(NS, "arena-foobar").unwrap();
        assert!(!after.is_ready());
        assert_eq!(before.annotations(), after.annotations());
        assert_eq!(f.cache.get(&team("foobar")).await, None);
    }

    #[tokio::test]
    async fn test_restart_missing_workload() {
        let f = fixture();

        let err = f.manager.restart(&team("foobar")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
