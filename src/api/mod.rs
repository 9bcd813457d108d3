//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod entry;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod teams;
pub mod types;

pub use router::create_router;
pub use state::{AppState, SessionCookieConfig};
