//! Proxying of team traffic

mod forwarder;
mod resolver;
mod router;

pub use forwarder::{ForwardError, ProxyForwarder};
pub use resolver::{BackendUrlResolver, FixedUrlResolver, ServiceUrlResolver};
pub use router::{ProxyRouter, RedirectReason, RouteDecision};
