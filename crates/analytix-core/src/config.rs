//! Pipeline timing and front-end configuration.
//!
//! Values are resolved as CLI flags > `ANALYTIX_*` environment variables >
//! config file > defaults. Front ends own the file and flag layers; this module
//! provides the defaults and the environment layer.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed delays and ramp parameters of the simulated pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineTiming {
    /// Wait between `uploading` and `running`.
    pub upload_delay_ms: u64,
    /// Wait between `running` and `analyzing`.
    pub run_delay_ms: u64,
    /// Wait between `analyzing` and `done`.
    pub analyze_delay_ms: u64,
    /// How long the progress ramp takes to reach its target.
    pub ramp_duration_ms: u64,
    /// Progress value the ramp converges to.
    pub ramp_target: u8,
    /// Sampling period of the ramp.
    pub frame_interval_ms: u64,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            upload_delay_ms: 600,
            run_delay_ms: 900,
            analyze_delay_ms: 1400,
            ramp_duration_ms: 1200,
            ramp_target: 98,
            frame_interval_ms: 16,
        }
    }
}

impl PipelineTiming {
    pub fn upload_delay(&self) -> Duration {
        Duration::from_millis(self.upload_delay_ms)
    }

    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }

    pub fn analyze_delay(&self) -> Duration {
        Duration::from_millis(self.analyze_delay_ms)
    }

    pub fn ramp_duration(&self) -> Duration {
        Duration::from_millis(self.ramp_duration_ms)
    }

    /// Frame period, never zero so the ramp ticker can be built.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Total wall time from `start()` to `done`.
    pub fn total(&self) -> Duration {
        self.upload_delay() + self.run_delay() + self.analyze_delay()
    }
}

/// Configuration shared by the front ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: PipelineTiming,
    /// Where exported documents are written.
    pub export_dir: Option<PathBuf>,
    /// Backing file for the key-value store.
    pub store_path: Option<PathBuf>,
}

impl Config {
    /// Overlay `ANALYTIX_*` variables read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let timing = &mut self.timing;
        override_parsed(&lookup, "ANALYTIX_UPLOAD_DELAY_MS", &mut timing.upload_delay_ms);
        override_parsed(&lookup, "ANALYTIX_RUN_DELAY_MS", &mut timing.run_delay_ms);
        override_parsed(&lookup, "ANALYTIX_ANALYZE_DELAY_MS", &mut timing.analyze_delay_ms);
        override_parsed(&lookup, "ANALYTIX_RAMP_DURATION_MS", &mut timing.ramp_duration_ms);
        override_parsed(&lookup, "ANALYTIX_RAMP_TARGET", &mut timing.ramp_target);
        override_parsed(&lookup, "ANALYTIX_FRAME_INTERVAL_MS", &mut timing.frame_interval_ms);

        if let Some(dir) = lookup("ANALYTIX_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("ANALYTIX_STORE_PATH") {
            self.store_path = Some(PathBuf::from(path));
        }

        if timing.ramp_target > 100 {
            log::warn!("ramp target {} above 100, clamping", timing.ramp_target);
            timing.ramp_target = 100;
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => log::warn!("ignoring {key}={raw:?}: not a valid value"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_pipeline() {
        let timing = PipelineTiming::default();
        assert_eq!(timing.upload_delay(), Duration::from_millis(600));
        assert_eq!(timing.run_delay(), Duration::from_millis(900));
        assert_eq!(timing.analyze_delay(), Duration::from_millis(1400));
        assert_eq!(timing.ramp_duration(), Duration::from_millis(1200));
        assert_eq!(timing.ramp_target, 98);
        assert_eq!(timing.total(), Duration::from_millis(2900));
    }

    #[test]
    fn env_overrides_timing_and_paths() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[
            ("ANALYTIX_UPLOAD_DELAY_MS", "10"),
            ("ANALYTIX_RAMP_TARGET", " 90 "),
            ("ANALYTIX_EXPORT_DIR", "/tmp/out"),
        ]));
        assert_eq!(config.timing.upload_delay_ms, 10);
        assert_eq!(config.timing.ramp_target, 90);
        assert_eq!(config.timing.run_delay_ms, 900);
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn env_ignores_garbage() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[("ANALYTIX_RUN_DELAY_MS", "soon")]));
        assert_eq!(config.timing.run_delay_ms, 900);
    }

    #[test]
    fn ramp_target_clamped() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[("ANALYTIX_RAMP_TARGET", "250")]));
        assert_eq!(config.timing.ramp_target, 100);
    }

    #[test]
    fn zero_frame_interval_is_usable() {
        let timing = PipelineTiming {
            frame_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(timing.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"timing": {"upload_delay_ms": 5}, "export_dir": "exports"}"#,
        )
        .unwrap();
        assert_eq!(config.timing.upload_delay_ms, 5);
        assert_eq!(config.timing.analyze_delay_ms, 1400);
        assert_eq!(config.export_dir, Some(PathBuf::from("exports")));
    }
}
