//! Team domain module
//!
//! A team is a tenant of the arena. Its state lives entirely in the cluster:
//! the team's workload, its readiness and its metadata annotations.

mod entity;
mod validation;

pub use entity::TeamName;
pub use validation::{validate_team_name, TeamValidationError, MAX_TEAM_NAME_LENGTH};
