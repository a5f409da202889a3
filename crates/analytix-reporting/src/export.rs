use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use analytix_core::ResultRecord;
use serde::Serialize;
use thiserror::Error;

use crate::types::{ExportFormat, ReportMeta};

const PRODUCT: &str = "AnalytiX Hub";
const COLUMNS: [&str; 5] = [
    "S.No",
    "File name",
    "File type",
    "File description",
    "Key findings / insights",
];
const EMPTY_ROW: &str = "No output yet.";

const STYLE: &str = "\
*{box-sizing:border-box}\
body{font-family:ui-sans-serif,system-ui,sans-serif;margin:24px;color:#0f172a}\
h1{font-size:20px;margin:0 0 4px}\
.sub{color:#475569;margin:0 0 16px}\
table{width:100%;border-collapse:collapse;font-size:12px}\
th,td{border:1px solid #e2e8f0;padding:8px;text-align:left;vertical-align:top}\
thead th{background:#f1f5f9}\
td.empty{text-align:center;color:#64748b}\
@page{margin:20mm}";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Escape `& < > " '` for embedding in HTML text or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a standalone, printable HTML document of `records`.
///
/// With no records the table body holds a single placeholder row.
pub fn render_html(meta: &ReportMeta, records: &[ResultRecord]) -> String {
    let mut html = String::new();
    let name = escape_html(&meta.analysis_name);
    let stamp = meta.generated_at.format("%Y-%m-%d %H:%M:%S");

    html.push_str("<!doctype html>\n<html><head><meta charset=\"utf-8\"/>\n");
    let _ = writeln!(html, "<title>{PRODUCT} - {name}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head><body>\n");
    let _ = writeln!(html, "<h1>{PRODUCT} - {name}</h1>");
    let _ = writeln!(html, "<div class=\"sub\">Exported on {stamp}</div>");

    html.push_str("<table>\n<thead><tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr></thead>\n<tbody>");

    if records.is_empty() {
        let _ = write!(
            html,
            "<tr><td class=\"empty\" colspan=\"{}\">{EMPTY_ROW}</td></tr>",
            COLUMNS.len()
        );
    } else {
        for r in records {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                r.ordinal,
                escape_html(&r.file_name),
                escape_html(&r.file_type),
                escape_html(&r.description),
                escape_html(&r.insights),
            );
        }
    }

    html.push_str("</tbody>\n</table>\n</body></html>\n");
    html
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    analysis: &'a str,
    generated_at: String,
    results: &'a [ResultRecord],
}

pub fn render_json(meta: &ReportMeta, records: &[ResultRecord]) -> Result<String, ExportError> {
    let report = JsonReport {
        analysis: &meta.analysis_name,
        generated_at: meta.generated_at.to_rfc3339(),
        results: records,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn render(
    format: ExportFormat,
    meta: &ReportMeta,
    records: &[ResultRecord],
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Html => Ok(render_html(meta, records)),
        ExportFormat::Json => render_json(meta, records),
    }
}

/// Render `records` and write them to `path`, creating parent directories.
pub fn export_results(
    format: ExportFormat,
    meta: &ReportMeta,
    records: &[ResultRecord],
    path: &Path,
) -> Result<(), ExportError> {
    let body = render(format, meta, records)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    log::info!(
        "exported {} row(s) as {format} to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytix_core::InputFile;

    fn meta() -> ReportMeta {
        ReportMeta::new("Quarterly Audit")
    }

    #[test]
    fn escapes_all_five() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn empty_export_has_placeholder_row() {
        let html = render_html(&meta(), &[]);
        assert!(html.contains(EMPTY_ROW));
        assert!(html.contains("colspan=\"5\""));
        assert!(!html.contains("<tbody></tbody>"));
    }

    #[test]
    fn rows_are_escaped() {
        let record = ResultRecord::synthesize(1, &InputFile::new("a<b&c.txt", 10));
        let html = render_html(&meta(), &[record]);
        assert!(html.contains("a&lt;b&amp;c.txt"));
        assert!(!html.contains("a<b"));
        assert!(!html.contains("b&c"));
        assert!(!html.contains(EMPTY_ROW));
    }

    #[test]
    fn analysis_name_is_escaped() {
        let html = render_html(&ReportMeta::new("<script>"), &[]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn header_and_timestamp_present() {
        let html = render_html(&meta(), &[]);
        for column in COLUMNS {
            assert!(html.contains(&format!("<th>{column}</th>")));
        }
        assert!(html.contains("Exported on "));
        assert!(html.contains("AnalytiX Hub - Quarterly Audit"));
    }

    #[test]
    fn rows_keep_given_order() {
        let records = vec![
            ResultRecord::synthesize(2, &InputFile::new("second.csv", 1)),
            ResultRecord::synthesize(1, &InputFile::new("first.csv", 1)),
        ];
        let html = render_html(&meta(), &records);
        let second = html.find("second.csv").unwrap();
        let first = html.find("first.csv").unwrap();
        assert!(second < first);
    }

    #[test]
    fn json_export_lists_records() {
        let records = vec![ResultRecord::synthesize(1, &InputFile::new("report.PDF", 2048))];
        let json = render_json(&meta(), &records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["analysis"], "Quarterly Audit");
        assert_eq!(value["results"][0]["file_type"], "PDF");
        assert!(value["generatedAt"].is_string());
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");
        export_results(ExportFormat::Html, &meta(), &[], &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!doctype html>"));
    }
}
