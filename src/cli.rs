use crate::{
    config::Config,
    engine::{poppler::PopplerSource, tesseract::TesseractCli},
    pipeline::{ScanRequest, Scanner},
    report::{FinalReport, RunManifest},
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "pagescan", version)]
#[command(about = "Search rendered PDF pages for literal terms with OCR")]
pub struct Args {
    /// PDF document to scan.
    pub document: PathBuf,

    /// Newline-delimited file of search terms.
    pub terms: PathBuf,

    /// Pages to scan: `all`, a single page `N`, or `A-B`.
    pub range: String,

    /// Number of parallel workers (capped at the number of pages).
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Path to config TOML. If omitted, uses ./pagescan.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the worker assignments as JSON and exit without scanning.
    #[arg(long)]
    pub plan: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

/// Runs the scan and returns the process exit code.
///
/// Fatal errors are returned to the caller, which prints them to stderr
/// whatever the log level is.
pub fn dispatch(args: Args) -> Result<i32> {
    let cfg = load_config(args.config.as_deref())?;
    let _guard = init_logging(&args, &cfg)?;
    scan(&args, &cfg)
}

fn scan(args: &Args, cfg: &Config) -> Result<i32> {
    let scanner = Scanner::new(cfg, PopplerSource::new(cfg), TesseractCli::new(cfg));
    let req = ScanRequest {
        document: args.document.clone(),
        terms: args.terms.clone(),
        range: args.range.clone(),
        workers: args.workers,
    };

    let plan = scanner.plan(&req)?;
    if args.plan {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(0);
    }

    let started = now_rfc3339();
    let report = scanner.execute(&plan)?;

    let pretty = args.pretty || cfg.output.pretty;
    let json = if pretty {
        serde_json::to_string_pretty(&report.pages)?
    } else {
        serde_json::to_string(&report.pages)?
    };
    println!("{json}");

    // Not routed through tracing: these must survive `--log-level off`.
    for line in report.failure_diagnostics() {
        eprintln!("pagescan: {line}");
    }

    if !cfg.output.manifest_path.is_empty() {
        write_manifest(
            Path::new(&cfg.output.manifest_path),
            &plan.document,
            &report,
            plan.range,
            started,
        )?;
    }

    Ok(report.exit_code())
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("pagescan.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON report, so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if cfg.logging.write_to_file && !cfg.logging.file_path.is_empty() {
        let path = Path::new(&cfg.logging.file_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn write_manifest(
    path: &Path,
    document: &Path,
    report: &FinalReport,
    range: crate::page_range::PageRange,
    started: String,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let manifest = RunManifest {
        document: document.display().to_string(),
        range,
        started,
        finished: now_rfc3339(),
        workers: report.workers.clone(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing manifest: {}", path.display()))?;
    info!("manifest written to {}", path.display());
    Ok(())
}
