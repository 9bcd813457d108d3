//! Settings update validation

use serde_json::{Map, Value};

use super::entity::Setting;
use crate::domain::DomainError;

/// Validate a whole settings payload before any of it is applied.
///
/// Every key must name a known setting and every value must be a boolean;
/// the first violation rejects the entire payload.
pub fn parse_settings_update(payload: &Map<String, Value>) -> Result<Vec<(Setting, bool)>, DomainError> {
    payload
        .iter()
        .map(|(name, value)| {
            let setting: Setting = name.parse()?;
            let value = value.as_bool().ok_or_else(|| {
                DomainError::validation(format!("invalid value: {}, for setting: {}", value, name))
            })?;
            Ok((setting, value))
        })
        .collect()
}
