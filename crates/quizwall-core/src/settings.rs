//! Per-module attempt configuration.

use serde::{Deserialize, Serialize};

/// Default number of questions drawn when `pick_count` is not configured.
pub const DEFAULT_PICK_LIMIT: usize = 10;

/// How attempts for one module are built, limited, and graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Only the first `pool_size` questions of the pool are eligible (None = all).
    #[serde(default)]
    pub pool_size: Option<usize>,
    /// Questions per attempt (None = `min(10, pool_size)`).
    #[serde(default)]
    pub pick_count: Option<usize>,
    /// Attempts allowed before the module locks, unless mastered.
    #[serde(default = "default_attempt_limit")]
    pub attempt_limit: u32,
    /// Score at or above which the module counts as completed.
    #[serde(default = "default_mastery_pct")]
    pub mastery_pct: u8,
    /// Countdown length; 0 disables the timer.
    #[serde(default)]
    pub time_limit_seconds: u32,
}

fn default_attempt_limit() -> u32 {
    3
}

fn default_mastery_pct() -> u8 {
    80
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            pool_size: None,
            pick_count: None,
            attempt_limit: default_attempt_limit(),
            mastery_pct: default_mastery_pct(),
            time_limit_seconds: 0,
        }
    }
}

impl ModuleSettings {
    /// Number of eligible questions for a pool with `available` questions.
    pub fn effective_pool_size(&self, available: usize) -> usize {
        match self.pool_size {
            Some(n) if n > 0 => n.min(available),
            _ => available,
        }
    }

    /// Number of questions drawn for a pool with `available` questions.
    pub fn effective_pick_count(&self, available: usize) -> usize {
        let eligible = self.effective_pool_size(available);
        match self.pick_count {
            Some(n) if n > 0 => n.min(eligible),
            _ => DEFAULT_PICK_LIMIT.min(eligible),
        }
    }

    pub fn has_timer(&self) -> bool {
        self.time_limit_seconds > 0
    }

    /// Apply a partial override on top of these settings.
    pub fn merged(&self, overrides: &ModuleOverrides) -> ModuleSettings {
        ModuleSettings {
            pool_size: overrides.pool_size.or(self.pool_size),
            pick_count: overrides.pick_count.or(self.pick_count),
            attempt_limit: overrides.attempt_limit.unwrap_or(self.attempt_limit),
            mastery_pct: overrides.mastery_pct.unwrap_or(self.mastery_pct),
            time_limit_seconds: overrides
                .time_limit_seconds
                .unwrap_or(self.time_limit_seconds),
        }
    }
}

/// Partial settings for a single module; unset fields inherit the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOverrides {
    #[serde(default)]
    pub pool_size: Option<usize>,
    #[serde(default)]
    pub pick_count: Option<usize>,
    #[serde(default)]
    pub attempt_limit: Option<u32>,
    #[serde(default)]
    pub mastery_pct: Option<u8>,
    #[serde(default)]
    pub time_limit_seconds: Option<u32>,
}
