//! Team name validation

use thiserror::Error;

/// Errors that can occur during team name validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team name cannot be empty")]
    Empty,

    #[error("Team name cannot exceed {0} characters")]
    TooLong(usize),

    #[error("Team name can only contain lowercase letters, digits and hyphens")]
    InvalidCharacters,

    #[error("Team name must start and end with a letter or digit")]
    InvalidFormat,
}

/// Team names become part of cluster resource names, so they are kept DNS-label safe.
pub const MAX_TEAM_NAME_LENGTH: usize = 16;

/// Validate a team name
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.is_empty() {
        return Err(TeamValidationError::Empty);
    }

    if name.len() > MAX_TEAM_NAME_LENGTH {
        return Err(TeamValidationError::TooLong(MAX_TEAM_NAME_LENGTH));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(TeamValidationError::InvalidCharacters);
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(TeamValidationError::InvalidFormat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_team_names() {
        assert!(validate_team_name("foobar").is_ok());
        assert!(validate_team_name("team-42").is_ok());
        assert!(validate_team_name("a").is_ok());
        assert!(validate_team_name("admin").is_ok());
    }

    #[test]
    fn test_empty_team_name() {
        assert_eq!(validate_team_name(""), Err(TeamValidationError::Empty));
    }

    #[test]
    fn test_team_name_too_long() {
        let name = "a".repeat(MAX_TEAM_NAME_LENGTH + 1);
        assert_eq!(
            validate_team_name(&name),
            Err(TeamValidationError::TooLong(MAX_TEAM_NAME_LENGTH))
        );
    }

    #[test]
    fn test_team_name_invalid_characters() {
        assert_eq!(
            validate_team_name("Team"),
            Err(TeamValidationError::InvalidCharacters)
        );
        assert_eq!(
            validate_team_name("team_1"),
            Err(TeamValidationError::InvalidCharacters)
        );
        assert_eq!(
            validate_team_name("team.1"),
            Err(TeamValidationError::InvalidCharacters)
        );
    }

    #[test]
    fn test_team_name_hyphen_edges() {
        assert_eq!(
            validate_team_name("-team"),
            Err(TeamValidationError::InvalidFormat)
        );
        assert_eq!(
            validate_team_name("team-"),
            Err(TeamValidationError::InvalidFormat)
        );
    }
}
