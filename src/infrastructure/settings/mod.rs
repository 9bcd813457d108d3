//! Settings infrastructure

mod store;

pub use store::SettingsStore;
