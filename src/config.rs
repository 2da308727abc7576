//! Persisted analytics settings.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::animation::{DEFAULT_DURATION_SECS, DEFAULT_FRAME_TARGET};
use crate::decimate::DEFAULT_DECIMATION_THRESHOLD;
use crate::personal_best::PbMode;

/// Tunables for chart construction. Persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Trailing window of the "Average of N" line; 0 hides it.
    pub average_window: usize,
    pub show_average: bool,
    pub show_pb: bool,
    pub pb_mode: PbMode,
    pub decimation_threshold: usize,
    /// Above this many points scatter markers shrink.
    pub dense_marker_threshold: usize,
    pub speed_bin_count: usize,
    pub frame_target: usize,
    pub animation_duration_secs: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            average_window: 10,
            show_average: true,
            show_pb: true,
            pb_mode: PbMode::Gradual,
            decimation_threshold: DEFAULT_DECIMATION_THRESHOLD,
            dense_marker_threshold: 6000,
            speed_bin_count: 50,
            frame_target: DEFAULT_FRAME_TARGET,
            animation_duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> AnalyticsConfig;
    fn save(&self, cfg: &AnalyticsConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "racetrend") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("racetrend_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> AnalyticsConfig {
        let Ok(bytes) = fs::read(&self.path) else {
            return AnalyticsConfig::default();
        };
        match serde_json::from_slice::<AnalyticsConfig>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                AnalyticsConfig::default()
            }
        }
    }

    fn save(&self, cfg: &AnalyticsConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = AnalyticsConfig::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = AnalyticsConfig {
            average_window: 25,
            show_average: false,
            show_pb: true,
            pb_mode: PbMode::Snap,
            decimation_threshold: 1000,
            dense_marker_threshold: 100,
            speed_bin_count: 20,
            frame_target: 24,
            animation_duration_secs: 5,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), AnalyticsConfig::default());

        fs::write(&path, b"{not json").unwrap();
        assert_eq!(store.load(), AnalyticsConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"average_window": 50, "pb_mode": "snap"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.average_window, 50);
        assert_eq!(cfg.pb_mode, PbMode::Snap);
        assert_eq!(cfg.dense_marker_threshold, 6000);
    }
}
