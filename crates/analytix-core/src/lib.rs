use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod controller;
pub mod interpolate;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod store;

// Re-export for convenience
pub use config::{Config, PipelineTiming};
pub use controller::{AnalysisController, RunHandle, RunOutcome, RunSnapshot};
pub use interpolate::Interpolation;
pub use pipeline::{Checkpoint, Ramp, StageBadge, StageState, stage_badges};
pub use record::ResultRecord;
pub use session::{AnalysisMeta, Overview, Session, SessionError};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Extensions the input picker advertises. Advisory only; never enforced.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".csv", ".json", ".png", ".jpg", ".jpeg",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("no input file selected")]
    NoInputSelected,
    #[error("an analysis run is already in progress")]
    RunAlreadyInProgress,
    #[error("analysis task failed: {0}")]
    TaskFailed(String),
    #[error("no async runtime available to drive the run")]
    NoRuntime,
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a file")]
    NotAFile(PathBuf),
}

/// Stage of an analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Uploading,
    Running,
    Analyzing,
    Done,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Uploading => "Uploading",
            Self::Running => "Paddle running",
            Self::Analyzing => "Analyzing",
            Self::Done => "Completed",
        }
    }

    /// Whether a run is currently driving this status forward.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Uploading | Self::Running | Self::Analyzing)
    }

    /// Position in the forward-only sequence, used to order stages.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Uploading => 1,
            Self::Running => 2,
            Self::Analyzing => 3,
            Self::Done => 4,
        }
    }
}

/// A file picked for analysis. Only its name and size are ever looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub name: String,
    pub size: u64,
}

impl InputFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Reads the name and size of a file on disk. The contents are never opened.
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let meta = std::fs::metadata(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(InputError::NotAFile(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, meta.len()))
    }

    /// Text after the last `.` of the name, or empty when there is none.
    pub fn extension(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        }
    }

    /// Uppercased extension, shown as the file type.
    pub fn file_type(&self) -> String {
        self.extension().to_uppercase()
    }

    /// Size in KiB, rounded up.
    pub fn size_kb(&self) -> u64 {
        self.size.div_ceil(1024)
    }

    /// Whether the extension is on [`ALLOWED_EXTENSIONS`] (case-insensitive).
    pub fn is_allowed(&self) -> bool {
        let ext = format!(".{}", self.extension().to_lowercase());
        ALLOWED_EXTENSIONS.contains(&ext.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_uses_last_dot() {
        let file = InputFile::new("archive.tar.csv", 10);
        assert_eq!(file.extension(), "csv");
        assert_eq!(file.file_type(), "CSV");
    }

    #[test]
    fn extension_empty_without_dot() {
        let file = InputFile::new("Makefile", 10);
        assert_eq!(file.extension(), "");
        assert_eq!(file.file_type(), "");
        assert!(!file.is_allowed());
    }

    #[test]
    fn size_rounds_up_to_kb() {
        assert_eq!(InputFile::new("a.txt", 0).size_kb(), 0);
        assert_eq!(InputFile::new("a.txt", 1).size_kb(), 1);
        assert_eq!(InputFile::new("a.txt", 2048).size_kb(), 2);
        assert_eq!(InputFile::new("a.txt", 2049).size_kb(), 3);
    }

    #[test]
    fn allow_list_ignores_case() {
        assert!(InputFile::new("report.PDF", 1).is_allowed());
        assert!(InputFile::new("photo.jpeg", 1).is_allowed());
        assert!(!InputFile::new("binary.exe", 1).is_allowed());
    }

    #[test]
    fn from_path_reads_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, vec![b'x'; 3000]).unwrap();
        let input = InputFile::from_path(&path).unwrap();
        assert_eq!(input.name, "sample.txt");
        assert_eq!(input.size, 3000);
    }

    #[test]
    fn from_path_rejects_dirs_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            InputFile::from_path(dir.path()),
            Err(InputError::NotAFile(_))
        ));
        assert!(matches!(
            InputFile::from_path(&dir.path().join("missing.txt")),
            Err(InputError::Io { .. })
        ));
    }

    #[test]
    fn in_flight_statuses() {
        assert!(!RunStatus::Idle.is_in_flight());
        assert!(RunStatus::Uploading.is_in_flight());
        assert!(RunStatus::Running.is_in_flight());
        assert!(RunStatus::Analyzing.is_in_flight());
        assert!(!RunStatus::Done.is_in_flight());
    }
}
