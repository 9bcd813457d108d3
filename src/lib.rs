//! Arena Balancer
//!
//! Routes every team's traffic to its own instance in the cluster:
//! - Signed session cookies identifying a team
//! - Team instance lifecycle (create, join, passcode reset, restart, delete)
//! - Readiness-cached proxy routing with redirect outcomes
//! - Runtime settings toggled by the admin

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::{AppState, SessionCookieConfig};
use domain::{ClusterClient, DomainError, SettingsSnapshot};
use infrastructure::{
    auth::{PasscodeAuthenticator, PasscodeGenerator, RandomPasscodeGenerator, SignedTokenCodec},
    cache::{InstanceReadinessCache, ReadinessCacheConfig},
    cluster::{DeadlineClusterClient, InstanceTemplate},
    proxy::{BackendUrlResolver, ProxyForwarder, ProxyRouter, ServiceUrlResolver},
    settings::SettingsStore,
    team::{TeamLifecycleConfig, TeamLifecycleManager},
};

/// Wire up the application with a random passcode generator and in-cluster backend addresses
pub fn create_app_state(
    config: &AppConfig,
    cluster: Arc<dyn ClusterClient>,
) -> Result<AppState, DomainError> {
    create_app_state_with(
        config,
        cluster,
        Arc::new(RandomPasscodeGenerator::new()),
        None,
    )
}

/// Wire up the application with explicit strategies.
///
/// Every cluster call made through the returned state is bounded by
/// `balancer.cluster_timeout_ms`.
pub fn create_app_state_with(
    config: &AppConfig,
    cluster: Arc<dyn ClusterClient>,
    passcode_generator: Arc<dyn PasscodeGenerator>,
    backend_urls: Option<Arc<dyn BackendUrlResolver>>,
) -> Result<AppState, DomainError> {
    let balancer = &config.balancer;

    if balancer.cookie.signing_key.is_empty() {
        return Err(DomainError::validation(
            "balancer.cookie.signing_key must be set",
        ));
    }

    let cluster: Arc<dyn ClusterClient> = Arc::new(DeadlineClusterClient::new(
        cluster,
        balancer.cluster_timeout(),
    ));
    let template = Arc::new(InstanceTemplate::from(&config.instance));
    let tokens = Arc::new(SignedTokenCodec::new(&balancer.cookie.signing_key));
    let settings = Arc::new(SettingsStore::new(SettingsSnapshot::from(&balancer.settings)));
    let cache = Arc::new(InstanceReadinessCache::with_config(
        ReadinessCacheConfig::default()
            .with_ttl(balancer.readiness_cache_ttl())
            .with_max_capacity(balancer.readiness_cache_capacity),
    ));
    let passcodes = Arc::new(PasscodeAuthenticator::new(
        passcode_generator,
        (&balancer.passcode).into(),
    ));

    let teams = TeamLifecycleManager::new(
        cluster.clone(),
        template.clone(),
        passcodes,
        tokens.clone(),
        cache.clone(),
        TeamLifecycleConfig {
            namespace: balancer.namespace.clone(),
            max_instances: balancer.max_instances,
            admin_password: balancer.admin.password.clone(),
        },
    );

    let proxy_router = ProxyRouter::new(
        tokens.clone(),
        settings.clone(),
        cache,
        cluster,
        template.clone(),
        balancer.namespace.clone(),
    )
    .with_last_request_patch_timeout(balancer.last_request_patch_timeout());

    let backend_urls = backend_urls.unwrap_or_else(|| {
        Arc::new(ServiceUrlResolver::new(template, balancer.namespace.clone()))
    });

    let forwarder = ProxyForwarder::new()
        .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

    Ok(AppState {
        teams: Arc::new(teams),
        proxy_router: Arc::new(proxy_router),
        forwarder: Arc::new(forwarder),
        backend_urls,
        settings,
        tokens,
        cookie: SessionCookieConfig {
            name: balancer.cookie.name.clone(),
            secure: balancer.cookie.secure,
        },
        ui_dir: config.server.ui_dir.clone().into(),
    })
}

#[cfg(test)]
pub mod test_support {
    //! Shared fixtures for tests

    use std::sync::Arc;

    use crate::api::AppState;
    use crate::config::{AppConfig, PasscodeConfig};
    use crate::infrastructure::auth::{
        FixedPasscodeGenerator, PasscodeAuthenticator, PasscodeHashCost, SignedTokenCodec,
    };
    use crate::infrastructure::cluster::InMemoryClusterClient;
    use crate::infrastructure::proxy::{BackendUrlResolver, FixedUrlResolver};

    pub const PASSCODE: &str = "12345678";
    pub const SIGNING_KEY: &str = "test-signing-key";
    pub const ADMIN_PASSWORD: &str = "admin-password";
    pub const NAMESPACE: &str = "test-namespace";

    pub fn token_codec() -> SignedTokenCodec {
        SignedTokenCodec::new(SIGNING_KEY)
    }

    pub fn passcode_authenticator() -> PasscodeAuthenticator {
        PasscodeAuthenticator::new(
            Arc::new(FixedPasscodeGenerator::new(PASSCODE)),
            PasscodeHashCost {
                memory_kib: 64,
                iterations: 1,
            },
        )
    }

    pub fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.balancer.namespace = NAMESPACE.to_string();
        config.balancer.cookie.signing_key = SIGNING_KEY.to_string();
        config.balancer.admin.password = ADMIN_PASSWORD.to_string();
        config.balancer.passcode = PasscodeConfig {
            hash_memory_kib: 64,
            hash_iterations: 1,
        };
        config
    }

    /// Application state over the given cluster, forwarding every team to `backend_url`
    pub fn app_state(cluster: Arc<InMemoryClusterClient>, backend_url: &str) -> AppState {
        let backend_urls: Arc<dyn BackendUrlResolver> = Arc::new(FixedUrlResolver::new(backend_url));

        crate::create_app_state_with(
            &config(),
            cluster,
            Arc::new(FixedPasscodeGenerator::new(PASSCODE)),
            Some(backend_urls),
        )
        .unwrap()
    }

    /// `Cookie` header value for a session of `identity`
    pub fn session_cookie(identity: &str) -> String {
        format!("balancer={}", token_codec().sign(identity).unwrap())
    }
}
