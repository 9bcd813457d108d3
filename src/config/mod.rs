//! Application configuration

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, BalancerConfig, ClusterBackend, ClusterConfig, CookieConfig,
    InstanceConfig, LogFormat, LoggingConfig, PasscodeConfig, ServerConfig, SettingsDefaults,
};
