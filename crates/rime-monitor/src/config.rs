//! Monitor configuration.

use crate::error::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Fields whose RMS is compared between time levels.
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    /// Relative-error threshold per field. A monitored field with no entry
    /// is evaluated and logged but never passes or fails a check.
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default = "default_steady_count")]
    pub steady_count_required: usize,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: f64,
    /// Upper bound on the total wait for steady state. None waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchdog_s: Option<f64>,
}

fn default_fields() -> Vec<String> {
    ["p", "U", "T"].iter().map(|f| f.to_string()).collect()
}

fn default_thresholds() -> BTreeMap<String, f64> {
    default_fields().into_iter().map(|f| (f, 1e-3)).collect()
}

fn default_steady_count() -> usize {
    5
}

fn default_poll_interval() -> f64 {
    30.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            thresholds: default_thresholds(),
            steady_count_required: default_steady_count(),
            poll_interval_s: default_poll_interval(),
            watchdog_s: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> MonitorResult<()> {
        let invalid = |what: String| Err(MonitorError::InvalidConfig { what });

        if self.fields.is_empty() {
            return invalid("at least one field must be monitored".to_string());
        }
        if self.steady_count_required == 0 {
            return invalid("steady_count_required must be at least 1".to_string());
        }
        if !(self.poll_interval_s.is_finite() && self.poll_interval_s >= 0.0) {
            return invalid(format!(
                "poll_interval_s must be finite and non-negative, got {}",
                self.poll_interval_s
            ));
        }
        if let Some(w) = self.watchdog_s {
            if !(w.is_finite() && w > 0.0) {
                return invalid(format!("watchdog_s must be positive, got {w}"));
            }
        }
        for (field, threshold) in &self.thresholds {
            if !(threshold.is_finite() && *threshold > 0.0) {
                return invalid(format!(
                    "threshold for '{field}' must be positive, got {threshold}"
                ));
            }
        }
        Ok(())
    }

    pub fn threshold(&self, field: &str) -> Option<f64> {
        self.thresholds.get(field).copied()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_s)
    }

    pub fn watchdog(&self) -> Option<Duration> {
        self.watchdog_s.map(Duration::from_secs_f64)
    }
}
