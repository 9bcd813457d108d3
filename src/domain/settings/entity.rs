//! Process-wide balancer settings

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A named boolean flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Setting {
    /// Proxy requests are routed to team instances
    BalancerEnabled,
    /// The score overview is visible to regular teams
    ScoreOverviewVisibleForUsers,
}

impl Setting {
    pub const ALL: [Setting; 2] = [Setting::BalancerEnabled, Setting::ScoreOverviewVisibleForUsers];

    /// Wire name used in the settings API
    pub fn name(&self) -> &'static str {
        match self {
            Self::BalancerEnabled => "balancerEnabled",
            Self::ScoreOverviewVisibleForUsers => "scoreOverviewVisibleForUsers",
        }
    }
}

impl FromStr for Setting {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|setting| setting.name() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown setting: {}", s)))
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Point-in-time copy of every setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub balancer_enabled: bool,
    pub score_overview_visible_for_users: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            balancer_enabled: true,
            score_overview_visible_for_users: true,
        }
    }
}

impl SettingsSnapshot {
    pub fn get(&self, setting: Setting) -> bool {
        match setting {
            Setting::BalancerEnabled => self.balancer_enabled,
            Setting::ScoreOverviewVisibleForUsers => self.score_overview_visible_for_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_names_round_trip() {
        for setting in Setting::ALL {
            assert_eq!(setting.name().parse::<Setting>().unwrap(), setting);
        }
    }

    #[test]
    fn test_unknown_setting() {
        let err = "nonExistingSetting".parse::<Setting>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: unknown setting: nonExistingSetting"
        );
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = SettingsSnapshot {
            balancer_enabled: false,
            score_overview_visible_for_users: true,
        };

        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["balancerEnabled"], false);
        assert_eq!(json["scoreOverviewVisibleForUsers"], true);
    }
}
