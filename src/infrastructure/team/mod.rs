//! Team lifecycle management

mod service;

pub use service::{InstanceSummary, JoinOutcome, TeamLifecycleConfig, TeamLifecycleManager};
