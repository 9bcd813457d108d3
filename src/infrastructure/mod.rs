//! Infrastructure layer - Implementations of the balancer's components

pub mod auth;
pub mod cache;
pub mod cluster;
pub mod logging;
pub mod proxy;
pub mod settings;
pub mod team;
