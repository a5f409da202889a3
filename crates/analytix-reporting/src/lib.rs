pub mod export;
pub mod types;

pub use export::{ExportError, escape_html, export_results, render, render_html, render_json};
pub use types::{ExportFormat, ReportMeta};
