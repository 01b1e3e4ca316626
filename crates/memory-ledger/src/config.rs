//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::CollectorSettings;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// YAML settings mapping loaded once at construction.
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// JSON stage reel used to bootstrap an empty ledger.
    #[serde(default = "default_reel_path")]
    pub reel_path: PathBuf,

    /// Redundant snapshot targets.
    #[serde(default)]
    pub snapshots: SnapshotTargets,

    /// Breath scheduler cadence.
    #[serde(default)]
    pub breath: BreathConfig,

    /// Ingestion buffer flags.
    #[serde(default)]
    pub collector: CollectorSettings,

    /// Nominal context window, reported next to the usage estimate.
    #[serde(default = "default_context_window")]
    pub context_window_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            reel_path: default_reel_path(),
            snapshots: SnapshotTargets::default(),
            breath: BreathConfig::default(),
            collector: CollectorSettings::default(),
            context_window_size: default_context_window(),
        }
    }
}

impl EngineConfig {
    /// Configuration rooted in a single data directory.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            settings_path: dir.join("settings.yaml"),
            reel_path: dir.join("memory_reel.json"),
            snapshots: SnapshotTargets {
                primary: dir.join("snapshots").join("memory_snapshot.json"),
                mirror: dir.join("mirror").join("memory_snapshot.json"),
            },
            ..Default::default()
        }
    }
}

/// The two independently configured snapshot locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTargets {
    pub primary: PathBuf,
    pub mirror: PathBuf,
}

impl Default for SnapshotTargets {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("data/snapshots/memory_snapshot.json"),
            mirror: PathBuf::from("data/mirror/memory_snapshot.json"),
        }
    }
}

impl SnapshotTargets {
    pub fn paths(&self) -> [&PathBuf; 2] {
        [&self.primary, &self.mirror]
    }
}

/// Breath scheduler cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathConfig {
    /// Seconds between ticks.
    #[serde(default = "default_interval")]
    pub interval_secs: f64,

    /// Commit a snapshot every N ticks. Zero disables tick-driven commits.
    #[serde(default = "default_commit_interval")]
    pub commit_interval: u64,

    /// Seconds to back off after a failed tick.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: f64,
}

impl Default for BreathConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            commit_interval: default_commit_interval(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

impl BreathConfig {
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_interval()))
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.error_backoff_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_error_backoff()))
    }

    /// Whether the tick numbered `cycle` should trigger a snapshot.
    pub fn commits_on(&self, cycle: u64) -> bool {
        self.commit_interval != 0 && cycle % self.commit_interval == 0
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("data/settings.yaml")
}

fn default_reel_path() -> PathBuf {
    PathBuf::from("data/memory_reel.json")
}

fn default_context_window() -> usize {
    128_000
}

fn default_interval() -> f64 {
    3.0
}

fn default_commit_interval() -> u64 {
    10
}

fn default_error_backoff() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breath_defaults() {
        let breath = BreathConfig::default();
        assert_eq!(breath.interval(), Duration::from_secs(3));
        assert_eq!(breath.error_backoff(), Duration::from_secs(1));
        assert_eq!(breath.commit_interval, 10);
    }

    #[test]
    fn test_commit_cadence() {
        let breath = BreathConfig::default();
        assert!(!breath.commits_on(9));
        assert!(breath.commits_on(10));
        assert!(breath.commits_on(20));

        let disabled = BreathConfig {
            commit_interval: 0,
            ..Default::default()
        };
        assert!(!disabled.commits_on(10));
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let breath = BreathConfig {
            interval_secs: -1.0,
            ..Default::default()
        };
        assert_eq!(breath.interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"breath": {"interval_secs": 0.5}}"#).unwrap();
        assert_eq!(config.breath.interval(), Duration::from_millis(500));
        assert_eq!(config.breath.commit_interval, 10);
        assert_eq!(config.context_window_size, 128_000);
        assert!(config.collector.reverse_order);
    }

    #[test]
    fn test_data_dir_layout() {
        let config = EngineConfig::with_data_dir("/var/lib/ledger");
        assert_eq!(
            config.reel_path,
            PathBuf::from("/var/lib/ledger/memory_reel.json")
        );
        assert_ne!(config.snapshots.primary, config.snapshots.mirror);
    }
}
