//! In-memory settings store shared by every request

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::domain::{Setting, SettingsSnapshot};

/// Process-wide mutable flags.
///
/// Each flag is an independent atomic, so reads never wait on writers and always
/// observe the latest committed value. Nothing is persisted; a restart falls back
/// to the configured defaults.
#[derive(Debug)]
pub struct SettingsStore {
    balancer_enabled: AtomicBool,
    score_overview_visible_for_users: AtomicBool,
}

impl SettingsStore {
    pub fn new(defaults: SettingsSnapshot) -> Self {
        Self {
            balancer_enabled: AtomicBool::new(defaults.balancer_enabled),
            score_overview_visible_for_users: AtomicBool::new(
                defaults.score_overview_visible_for_users,
            ),
        }
    }

    fn flag(&self, setting: Setting) -> &AtomicBool {
        match setting {
            Setting::BalancerEnabled => &self.balancer_enabled,
            Setting::ScoreOverviewVisibleForUsers => &self.score_overview_visible_for_users,
        }
    }

    pub fn get(&self, setting: Setting) -> bool {
        self.flag(setting).load(Ordering::SeqCst)
    }

    pub fn set(&self, setting: Setting, value: bool) {
        let previous = self.flag(setting).swap(value, Ordering::SeqCst);

        if previous != value {
            info!(setting = %setting, value, "Setting updated");
        }
    }

    /// Apply an already validated batch of updates
    pub fn apply(&self, updates: &[(Setting, bool)]) {
        for (setting, value) in updates {
            self.set(*setting, *value);
        }
    }

    pub fn balancer_enabled(&self) -> bool {
        self.get(Setting::BalancerEnabled)
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            balancer_enabled: self.get(Setting::BalancerEnabled),
            score_overview_visible_for_users: self.get(Setting::ScoreOverviewVisibleForUsers),
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(SettingsSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_defaults() {
        let store = SettingsStore::default();

        assert!(store.balancer_enabled());
        assert!(store.get(Setting::ScoreOverviewVisibleForUsers));
    }

    #[test]
    fn test_custom_defaults() {
        let store = SettingsStore::new(SettingsSnapshot {
            balancer_enabled: false,
            score_overview_visible_for_users: true,
        });

        assert!(!store.balancer_enabled());
    }

    #[test]
    fn test_set_and_snapshot() {
        let store = SettingsStore::default();
        store.set(Setting::BalancerEnabled, false);

        assert_eq!(
            store.snapshot(),
            SettingsSnapshot {
                balancer_enabled: false,
                score_overview_visible_for_users: true,
            }
        );
    }

    #[test]
    fn test_apply_batch() {
        let store = SettingsStore::default();
        store.apply(&[
            (Setting::BalancerEnabled, false),
            (Setting::ScoreOverviewVisibleForUsers, false),
        ]);

        assert!(!store.get(Setting::BalancerEnabled));
        assert!(!store.get(Setting::ScoreOverviewVisibleForUsers));
    }

    #[test]
    fn test_writes_visible_across_threads() {
        let store = Arc::new(SettingsStore::default());

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || store.set(Setting::BalancerEnabled, false))
        };
        writer.join().unwrap();

        assert!(!store.balancer_enabled());
    }
}
