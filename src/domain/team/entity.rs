//! Team identity

use serde::{Deserialize, Serialize};

use super::validation::{validate_team_name, TeamValidationError};

/// Team name - lowercase alphanumerics and hyphens, max 16 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// The distinguished identity allowed to administer the balancer
    pub const ADMIN: &'static str = "admin";

    /// Create a new TeamName after validation
    pub fn new(name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        Ok(Self(name))
    }

    /// The admin identity
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
