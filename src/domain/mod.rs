//! Domain layer - Core types and contracts

pub mod error;
pub mod settings;
pub mod team;
pub mod workload;

pub use error::DomainError;
pub use settings::{parse_settings_update, Setting, SettingsSnapshot};
pub use team::{TeamName, TeamValidationError};
pub use workload::{ClusterClient, ClusterError, ServiceSpec, Workload, WorkloadSpec};
