//! Configuration file support for the terminal front end.
//!
//! Sources, lowest priority first:
//! - `~/.config/analytix/config.toml`
//! - `ANALYTIX_*` environment variables
//! - command-line flags (applied by the caller)

use std::path::{Path, PathBuf};

use analytix_core::Config;
use anyhow::Context;

/// Location of the user config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("analytix").join("config.toml"))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("analytix")
}

/// Default backing file for logins and recent analyses.
pub fn default_store_path() -> PathBuf {
    data_dir().join("store.json")
}

/// The TUI owns the terminal, so logs go to a file.
pub fn default_log_path() -> PathBuf {
    data_dir().join("analytix-tui.log")
}

pub fn default_export_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Parse a config file. A missing file yields `None`.
pub fn load_file(path: &Path) -> anyhow::Result<Option<Config>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("config not found: {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("cannot read {}", path.display()));
        }
    };
    let config: Config =
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    log::info!("loaded config: {}", path.display());
    Ok(Some(config))
}

/// File config (if any) overlaid with `lookup`, with path defaults filled in.
pub fn resolve(
    file: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let mut config = match file {
        Some(path) => load_file(path)?.unwrap_or_default(),
        None => Config::default(),
    };
    config.apply_env(lookup);
    if config.store_path.is_none() {
        config.store_path = Some(default_store_path());
    }
    if config.export_dir.is_none() {
        config.export_dir = Some(default_export_dir());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("nope.toml")).unwrap().is_none());
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "export_dir = \"/tmp/reports\"\n\n[timing]\nupload_delay_ms = 5\nramp_target = 90\n",
        )
        .unwrap();
        let config = resolve(Some(&path), no_env).unwrap();
        assert_eq!(config.timing.upload_delay_ms, 5);
        assert_eq!(config.timing.ramp_target, 90);
        assert_eq!(config.timing.run_delay_ms, 900);
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/reports")));
        assert!(config.store_path.is_some());
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing]\nupload_delay_ms = 5\n").unwrap();
        let config = resolve(Some(&path), |key| {
            (key == "ANALYTIX_UPLOAD_DELAY_MS").then(|| "7".to_string())
        })
        .unwrap();
        assert_eq!(config.timing.upload_delay_ms, 7);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing\n").unwrap();
        assert!(resolve(Some(&path), no_env).is_err());
    }
}
