use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::SettingsSnapshot;
use crate::infrastructure::cluster::InstanceTemplate;
use crate::infrastructure::auth::PasscodeHashCost;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub balancer: BalancerConfig,
    pub instance: InstanceConfig,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the entry page served under `/balancer`
    pub ui_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Namespace every team instance lives in
    pub namespace: String,
    pub max_instances: usize,
    pub readiness_cache_ttl_ms: u64,
    /// Most teams whose readiness is cached at once
    pub readiness_cache_capacity: u64,
    /// Deadline for every call into the cluster
    pub cluster_timeout_ms: u64,
    pub last_request_patch_timeout_ms: u64,
    pub cookie: CookieConfig,
    pub admin: AdminConfig,
    pub passcode: PasscodeConfig,
    pub settings: SettingsDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    pub signing_key: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Empty disables the admin login
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasscodeConfig {
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsDefaults {
    pub balancer_enabled: bool,
    pub score_overview_visible_for_users: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub name_prefix: String,
    pub app_name: String,
    pub part_of: String,
    pub image: String,
    pub tag: String,
    pub port: u16,
    pub health_path: String,
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub backend: ClusterBackend,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterBackend {
    #[default]
    Kubernetes,
    InMemory,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ui_dir: "public".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            max_instances: 100,
            readiness_cache_ttl_ms: 5000,
            readiness_cache_capacity: 10_000,
            cluster_timeout_ms: 5000,
            last_request_patch_timeout_ms: 5000,
            cookie: CookieConfig::default(),
            admin: AdminConfig::default(),
            passcode: PasscodeConfig::default(),
            settings: SettingsDefaults::default(),
        }
    }
}

impl BalancerConfig {
    pub fn readiness_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.readiness_cache_ttl_ms)
    }

    pub fn cluster_timeout(&self) -> Duration {
        Duration::from_millis(self.cluster_timeout_ms)
    }

    pub fn last_request_patch_timeout(&self) -> Duration {
        Duration::from_millis(self.last_request_patch_timeout_ms)
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "balancer".to_string(),
            signing_key: String::new(),
            secure: false,
        }
    }
}

impl Default for PasscodeConfig {
    fn default() -> Self {
        Self {
            hash_memory_kib: 19456,
            hash_iterations: 2,
        }
    }
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            balancer_enabled: true,
            score_overview_visible_for_users: true,
        }
    }
}

impl From<&SettingsDefaults> for SettingsSnapshot {
    fn from(defaults: &SettingsDefaults) -> Self {
        Self {
            balancer_enabled: defaults.balancer_enabled,
            score_overview_visible_for_users: defaults.score_overview_visible_for_users,
        }
    }
}

impl Default for InstanceConfig {
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

impl From<&InstanceConfig> for InstanceTemplate {
    fn from(config: &InstanceConfig) -> Self {
        Self {
            name_prefix: config.name_prefix.clone(),
            app_name: config.app_name.clone(),
            part_of: config.part_of.clone(),
            image: config.image.clone(),
            tag: config.tag.clone(),
            port: config.port,
            health_path: config.health_path.clone(),
            env: config.env.clone(),
        }
    }
}

impl From<&PasscodeConfig> for PasscodeHashCost {
    fn from(config: &PasscodeConfig) -> Self {
        Self {
            memory_kib: config.hash_memory_kib,
            iterations: config.hash_iterations,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
