//! Cache infrastructure

mod readiness;

pub use readiness::{InstanceReadinessCache, ReadinessCacheConfig};
