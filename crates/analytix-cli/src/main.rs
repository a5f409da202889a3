use std::path::{Path, PathBuf};

use analytix_core::session::slugify;
use analytix_core::{AnalysisController, Config, InputFile, ResultRecord, RunOutcome, RunStatus};
use analytix_reporting::{ExportFormat, ReportMeta, export_results};
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// AnalytiX Hub - run files through the simulated analysis pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Files to analyse, one run each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Analysis name used as the export title
    #[arg(long, default_value = "Analysis")]
    name: String,

    /// Path to write the export to (defaults to ANALYTIX_EXPORT_DIR/<name>.<format>)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export format: html or json
    #[arg(long, default_value = "html")]
    format: ExportFormat,

    /// Skip the pipeline delays
    #[arg(long)]
    instant: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // Resolve config from CLI flags > env vars > defaults
    let mut config = Config::from_env();
    if args.instant {
        config.timing.upload_delay_ms = 0;
        config.timing.run_delay_ms = 0;
        config.timing.analyze_delay_ms = 0;
        config.timing.ramp_duration_ms = 0;
    }

    let color = !args.no_color;
    let controller = AnalysisController::new(config.timing.clone());

    for path in &args.files {
        controller.select_input(input_from_path(path)?);
        run_one(&controller, color).await?;
    }

    let results = controller.snapshot().results;
    print_results(&results, color);

    let output = args.output.clone().or_else(|| {
        config
            .export_dir
            .as_deref()
            .map(|dir| default_export_path(dir, &args.name, args.format))
    });
    if let Some(path) = output {
        let meta = ReportMeta::new(&args.name);
        export_results(args.format, &meta, &results, &path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        log::info!("wrote {} export to {}", args.format, path.display());
        println!("Exported {} row(s) to {}", results.len(), path.display());
    }

    Ok(())
}

fn input_from_path(path: &Path) -> anyhow::Result<InputFile> {
    let input = InputFile::from_path(path)?;
    log::debug!("selected {} ({} bytes)", input.name, input.size);
    Ok(input)
}

async fn run_one(controller: &AnalysisController, color: bool) -> anyhow::Result<()> {
    let file_name = controller
        .snapshot()
        .input
        .map(|input| input.name)
        .unwrap_or_default();
    let handle = controller.start()?;
    let mut rx = controller.subscribe();

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.green/white} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut printed = 0;
    loop {
        let snap = rx.borrow_and_update().clone();
        for line in snap.log.iter().skip(printed) {
            bar.println(format!("  {} {line}", paint("•", color, Tone::Ok)));
        }
        printed = snap.log.len();
        bar.set_position(u64::from(snap.progress));
        bar.set_message(snap.status.label());

        if snap.status == RunStatus::Done || rx.changed().await.is_err() {
            break;
        }
    }

    let outcome = handle.wait().await?;
    bar.finish_and_clear();

    match outcome {
        RunOutcome::Completed(record) => {
            let done = format!("✓ {} analysed", record.file_name);
            println!("{}", paint(&done, color, Tone::Ok));
        }
        RunOutcome::Superseded => {
            log::warn!("run for {} was superseded before completing", file_name);
            println!("{}", paint("run was superseded", color, Tone::Warn));
        }
    }
    Ok(())
}

fn print_results(results: &[ResultRecord], color: bool) {
    if results.is_empty() {
        println!("No output yet.");
        return;
    }
    let header = format!(
        "{:>4}  {:<28} {:<6} {:<28} {}",
        "S.No", "File name", "Type", "Description", "Key findings / insights"
    );
    println!("{}", paint(&header, color, Tone::Header));
    for r in results {
        println!(
            "{:>4}  {:<28} {:<6} {:<28} {}",
            r.ordinal, r.file_name, r.file_type, r.description, r.insights
        );
    }
}

fn default_export_path(dir: &Path, name: &str, format: ExportFormat) -> PathBuf {
    let stem = match slugify(name) {
        s if s.is_empty() => "analysis".to_string(),
        s => s,
    };
    dir.join(format!("{stem}.{}", format.extension()))
}

#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Warn,
    Header,
}

fn paint(text: &str, color: bool, tone: Tone) -> String {
    if !color {
        return text.to_string();
    }
    match tone {
        Tone::Ok => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Header => text.bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "analytix", "a.pdf", "b.csv", "--name", "Audit", "--format", "json", "--instant",
        ])
        .unwrap();
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.name, "Audit");
        assert_eq!(args.format, ExportFormat::Json);
        assert!(args.instant);
        assert!(!args.no_color);
    }

    #[test]
    fn requires_a_file() {
        assert!(Args::try_parse_from(["analytix"]).is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Args::try_parse_from(["analytix", "a.pdf", "--format", "xlsx"]).is_err());
    }

    #[test]
    fn export_path_uses_slug() {
        let path = default_export_path(Path::new("/tmp/x"), "Q3 Audit!", ExportFormat::Html);
        assert_eq!(path, PathBuf::from("/tmp/x/q3-audit.html"));
        let path = default_export_path(Path::new("/tmp/x"), "???", ExportFormat::Json);
        assert_eq!(path, PathBuf::from("/tmp/x/analysis.json"));
    }

    #[test]
    fn reads_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, vec![b'x'; 3000]).unwrap();
        let input = input_from_path(&path).unwrap();
        assert_eq!(input.name, "sample.txt");
        assert_eq!(input.size, 3000);
        let err = input_from_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
        let err = input_from_path(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn plain_paint_without_color() {
        assert_eq!(paint("hi", false, Tone::Warn), "hi");
    }
}
