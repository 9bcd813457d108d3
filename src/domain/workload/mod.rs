//! Workload domain - a team's instance in the cluster and the contract used to manage it

mod entity;
mod repository;

pub use entity::{annotations, labels, ServiceSpec, Workload, WorkloadSpec};
pub use repository::{ClusterClient, ClusterError};
