//! Claude OAuth usage windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rolling usage window reported by the Anthropic usage endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClaudeUsageWindow {
    /// Utilization percent (0-100)
    pub utilization: f64,
    /// Window reset time; the Unix epoch when the upstream omitted it
    pub resets_at: DateTime<Utc>,
}

impl ClaudeUsageWindow {
    pub fn remaining_percent(&self) -> f64 {
        100.0 - self.utilization
    }

    pub fn remaining_fraction(&self) -> f64 {
        (100.0 - self.utilization) / 100.0
    }

    /// True when the upstream did not report a reset time.
    pub fn reset_unknown(&self) -> bool {
        self.resets_at == DateTime::<Utc>::UNIX_EPOCH
    }
}

impl Default for ClaudeUsageWindow {
    fn default() -> Self {
        Self { utilization: 0.0, resets_at: DateTime::<Utc>::UNIX_EPOCH }
    }
}

/// Per-account Claude quota snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClaudeQuotaData {
    pub five_hour: ClaudeUsageWindow,
    pub seven_day: ClaudeUsageWindow,
    pub last_updated: DateTime<Utc>,
}

impl ClaudeQuotaData {
    /// The window with the highest utilization (five-hour wins ties).
    pub fn peak_window(&self) -> &ClaudeUsageWindow {
        if self.seven_day.utilization > self.five_hour.utilization {
            &self.seven_day
        } else {
            &self.five_hour
        }
    }
}
