//! API request, response and error types

pub mod balancer;
pub mod error;
pub mod json;

pub use balancer::{InstanceListResponse, InstanceResponse, JoinRequest, MessageResponse};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
