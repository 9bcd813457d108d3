//! Cluster control-plane implementations

mod deadline;
mod in_memory;
mod kubernetes;
mod template;

pub use deadline::DeadlineClusterClient;
pub use in_memory::InMemoryClusterClient;
pub use kubernetes::KubernetesClusterClient;
pub use template::InstanceTemplate;
