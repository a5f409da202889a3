use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Self-contained printable document.
    #[default]
    Html,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub fn all() -> &'static [ExportFormat] {
        &[Self::Html, Self::Json]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "pdf" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Document-level fields of an export.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    /// Name of the analysis the rows belong to.
    pub analysis_name: String,
    pub generated_at: DateTime<Local>,
}

impl ReportMeta {
    pub fn new(analysis_name: impl Into<String>) -> Self {
        Self {
            analysis_name: analysis_name.into(),
            generated_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("HTML".parse::<ExportFormat>(), Ok(ExportFormat::Html));
        assert_eq!("pdf".parse::<ExportFormat>(), Ok(ExportFormat::Html));
        assert_eq!(" json ".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn display_matches_extension() {
        for format in ExportFormat::all() {
            assert_eq!(format.to_string(), format.extension());
        }
    }
}
