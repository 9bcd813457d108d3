//! Settings domain - named boolean flags shared by every request

mod entity;
mod validation;

pub use entity::{Setting, SettingsSnapshot};
pub use validation::parse_settings_update;
