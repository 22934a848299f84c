//! blink - find the stale, oversized files eating your disk.
//!
//! Usage:
//!   blink [PATH]                 Scan summary
//!   blink sizes [PATH]           Size distribution
//!   blink extensions [PATH]      Largest extensions
//!   blink clean [PATH]           Ranked deletion candidates, optional delete
//!   blink export [PATH]          Full report as JSON
//!   blink --help                 Show help

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use blink_analyze::{BinPercent, BinTotals, DeleteCandidate};
use blink_ops::{DeleteMode, DeletionEvent, DeletionReport, start_deletion};
use blink_scan::{JwalkScanner, ScanConfig, ScanPhase, ScanResult};

#[derive(Parser)]
#[command(
    name = "blink",
    version,
    about = "Find the stale, oversized files eating your disk",
    long_about = "blink scans a directory tree, breaks usage down by size and extension, \
                  and ranks files that have not been opened in a while as deletion \
                  candidates.\n\nRunning `blink [PATH]` prints a summary; use subcommands \
                  for the other views."
)]
struct Cli {
    /// Directory to scan (defaults to your home directory)
    path: Option<PathBuf>,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML file with scan settings; flags override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also scan dot-files and entries with the hidden attribute
    #[arg(long, global = true)]
    include_hidden: bool,

    /// Skip entries with this name at any depth (repeatable)
    #[arg(long, global = true, value_name = "NAME")]
    exclude: Vec<String>,

    /// Weight of the normalized size in the delete priority
    #[arg(long, global = true)]
    size_weight: Option<f64>,

    /// Weight of the staleness days in the delete priority
    #[arg(long, global = true)]
    stale_weight: Option<f64>,

    /// Multiplier that scales bytes before weighting
    #[arg(long, global = true)]
    normalization_rate: Option<f64>,

    /// Maximum directory depth to descend
    #[arg(long, global = true)]
    max_depth: Option<u32>,

    /// Worker threads (0 = one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Give up if the scan takes longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Totals for the scanned tree (default)
    Summary {
        /// Directory to scan
        path: Option<PathBuf>,
    },

    /// File count and bytes per size range
    Sizes {
        /// Directory to scan
        path: Option<PathBuf>,

        /// Show shares of the total instead of absolute values
        #[arg(short, long)]
        percent: bool,

        /// Show running totals from the smallest range up
        #[arg(short, long)]
        cumulative: bool,
    },

    /// Extensions holding the most bytes
    Extensions {
        /// Directory to scan
        path: Option<PathBuf>,

        /// Number of extensions to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        /// Largest files listed per extension
        #[arg(long, default_value = "3")]
        files: usize,
    },

    /// Rank stale files and optionally delete some of them
    Clean {
        /// Directory to scan
        path: Option<PathBuf>,

        /// Files not accessed for more than this many days are stale
        #[arg(short = 'd', long)]
        stale_days: Option<i64>,

        /// Number of candidates to list
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Candidate numbers to delete, e.g. 1,3,4
        #[arg(long, value_delimiter = ',', value_name = "N,...")]
        delete: Vec<usize>,

        /// Move to the trash instead of deleting permanently
        #[arg(long)]
        trash: bool,

        /// Actually delete; without this `--delete` is a dry run
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the full scan report as JSON
    Export {
        /// Directory to scan
        path: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        None => run_summary(&resolve_config(global, cli.path, None)?, global.format)?,
        Some(Command::Summary { path }) => {
            run_summary(&resolve_config(global, path.or(cli.path), None)?, global.format)?
        }
        Some(Command::Sizes {
            path,
            percent,
            cumulative,
        }) => {
            let config = resolve_config(global, path.or(cli.path), None)?;
            run_sizes(&config, percent, cumulative, global.format)?;
        }
        Some(Command::Extensions { path, top, files }) => {
            let config = resolve_config(global, path.or(cli.path), None)?;
            run_extensions(&config, top, files, global.format)?;
        }
        Some(Command::Clean {
            path,
            stale_days,
            top,
            delete,
            trash,
            yes,
        }) => {
            let overrides = CleanOverrides { stale_days, top };
            let config = resolve_config(global, path.or(cli.path), Some(overrides))?;
            let mode = if trash {
                DeleteMode::Trash
            } else {
                DeleteMode::Permanent
            };
            run_clean(&config, &delete, mode, yes, global.format)?;
        }
        Some(Command::Export { path, output }) => {
            let config = resolve_config(global, path.or(cli.path), None)?;
            run_export(&config, output)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. Default level is `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Explicit path, else the home directory, else the filesystem root on
/// Windows or the current directory elsewhere.
fn default_root() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        if cfg!(windows) {
            PathBuf::from("C:\\")
        } else {
            PathBuf::from(".")
        }
    })
}

struct CleanOverrides {
    stale_days: Option<i64>,
    top: Option<usize>,
}

/// Merge the config file, the default root and command-line flags.
fn resolve_config(
    global: &GlobalArgs,
    path: Option<PathBuf>,
    clean: Option<CleanOverrides>,
) -> Result<ScanConfig> {
    let mut config = match &global.config {
        Some(file) => load_config_file(file)?,
        None => ScanConfig::new(default_root()),
    };

    if let Some(path) = path {
        config.root = path;
    }
    if global.include_hidden {
        config.include_hidden = true;
    }
    config.exclude_names.extend(global.exclude.iter().cloned());
    if let Some(w) = global.size_weight {
        config.size_weight = w;
    }
    if let Some(w) = global.stale_weight {
        config.stale_weight = w;
    }
    if let Some(r) = global.normalization_rate {
        config.normalization_rate = r;
    }
    if let Some(depth) = global.max_depth {
        config.max_depth = Some(depth);
    }
    if let Some(threads) = global.threads {
        config.threads = threads;
    }
    if let Some(secs) = global.timeout {
        config.deadline = Some(Duration::from_secs(secs));
    }
    if let Some(clean) = clean {
        if let Some(days) = clean.stale_days {
            config.stale_threshold_days = days;
        }
        if let Some(top) = clean.top {
            config.top_k = top;
        }
    }

    config.validate().context("Invalid configuration")?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

/// Read a TOML scan config. `root` may be left out; it then defaults like
/// the command line does.
fn load_config_file(file: &Path) -> Result<ScanConfig> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read config file {}", file.display()))?;
    let mut table: toml::Table = toml::from_str(&text)
        .with_context(|| format!("Invalid TOML in {}", file.display()))?;
    if !table.contains_key("root") {
        table.insert(
            "root".to_string(),
            toml::Value::String(default_root().to_string_lossy().into_owned()),
        );
    }
    let config: ScanConfig = toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("Invalid scan settings in {}", file.display()))?;
    info!(file = %file.display(), "loaded config file");
    Ok(config)
}

/// Run a scan, drawing a one-line progress counter when stderr is a terminal.
fn run_scan(config: &ScanConfig) -> Result<ScanResult> {
    let scanner = JwalkScanner::new();
    let show_progress = std::io::stderr().is_terminal();
    let mut progress_rx = scanner.subscribe();

    eprintln!("Scanning {}...", config.root.display());

    let result = std::thread::scope(|s| {
        if show_progress {
            s.spawn(move || {
                loop {
                    match progress_rx.blocking_recv() {
                        Ok(p) if p.phase == ScanPhase::Complete => break,
                        Ok(p) => eprint!(
                            "\r {} files, {} dirs, {} ",
                            p.files_scanned,
                            p.dirs_scanned,
                            format_size(p.bytes_scanned)
                        ),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
                eprint!("\r{}\r", " ".repeat(60));
            });
        }
        // Dropping the scanner closes the progress channel.
        let scanner = scanner;
        scanner.scan(config)
    });

    result.context("Scan failed")
}

fn run_summary(config: &ScanConfig, format: OutputFormat) -> Result<()> {
    let result = run_scan(config)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
        return Ok(());
    }

    let stats = &result.stats;
    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", result.root.display(), format_size(stats.total_bytes));
    println!(
        " {} files, {} directories, {} symlinks, {} skipped",
        stats.total_files, stats.total_dirs, stats.total_symlinks, stats.skipped_entries
    );
    if let Some((path, size)) = &stats.largest_file {
        println!(" Largest file: {} ({})", path.display(), format_size(*size));
    }
    println!(
        " {} stale candidates, {} reclaimable",
        result.candidates.len(),
        format_size(result.reclaimable_bytes())
    );
    println!(" Scanned in {:.2}s", stats.duration.as_secs_f64());
    println!("{}", "─".repeat(60));
    print_skips(&result);

    Ok(())
}

/// One row of the `sizes` view; either absolute or percent values are set.
#[derive(Serialize)]
struct SizeRow {
    bin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_percent: Option<f64>,
}

impl From<BinTotals> for SizeRow {
    fn from(t: BinTotals) -> Self {
        Self {
            bin: t.bin.to_string(),
            count: Some(t.count),
            total_bytes: Some(t.total_bytes),
            count_percent: None,
            bytes_percent: None,
        }
    }
}

impl From<BinPercent> for SizeRow {
    fn from(p: BinPercent) -> Self {
        Self {
            bin: p.bin.to_string(),
            count: None,
            total_bytes: None,
            count_percent: Some(p.count_percent),
            bytes_percent: Some(p.bytes_percent),
        }
    }
}

fn run_sizes(config: &ScanConfig, percent: bool, cumulative: bool, format: OutputFormat) -> Result<()> {
    let result = run_scan(config)?;
    let hist = &result.histogram;

    let rows: Vec<SizeRow> = match (percent, cumulative) {
        (false, false) => hist.bins().into_iter().map(SizeRow::from).collect(),
        (false, true) => hist.to_cumulative().into_iter().map(SizeRow::from).collect(),
        (true, false) => hist.to_percentages().into_iter().map(SizeRow::from).collect(),
        (true, true) => hist
            .to_cumulative_percentages()
            .into_iter()
            .map(SizeRow::from)
            .collect(),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let title = match (percent, cumulative) {
        (false, false) => "Size Distribution",
        (false, true) => "Cumulative Size Distribution",
        (true, false) => "Size Distribution (%)",
        (true, true) => "Cumulative Size Distribution (%)",
    };
    println!();
    println!("{}", "─".repeat(60));
    println!(" {title}");
    println!("{}", "─".repeat(60));
    for row in &rows {
        match (row.count, row.total_bytes, row.count_percent, row.bytes_percent) {
            (Some(count), Some(bytes), _, _) => {
                println!("   {:<12} {:>10} files {:>12}", row.bin, count, format_size(bytes))
            }
            (_, _, Some(cp), Some(bp)) => {
                println!(
                    "   {:<12} {:>6.1}% of files {:>6.1}% of bytes  {}",
                    row.bin,
                    cp,
                    bp,
                    make_bar(bp / 100.0, 20)
                )
            }
            _ => {}
        }
    }
    println!();
    print_skips(&result);

    Ok(())
}

fn run_extensions(config: &ScanConfig, top: usize, files: usize, format: OutputFormat) -> Result<()> {
    let result = run_scan(config)?;
    let summaries = result.index.summaries(top, files);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let total = result.total_bytes();
    println!();
    println!("{}", "─".repeat(70));
    println!(" Largest Extensions");
    println!("{}", "─".repeat(70));
    if summaries.is_empty() {
        println!(" No files with an extension found.");
    }
    for summary in &summaries {
        let ratio = if total > 0 {
            summary.total_size as f64 / total as f64
        } else {
            0.0
        };
        println!(
            "   {:<12} {:>12} {:>8} files {:>5.1}% {}",
            truncate(&summary.extension, 12),
            format_size(summary.total_size),
            summary.file_count,
            ratio * 100.0,
            make_bar(ratio, 10)
        );
        for (path, size) in &summary.top_files {
            println!("       {:>12}  {}", format_size(*size), path.display());
        }
    }
    println!(
        "   {:<12} {:>12} {:>8} files",
        "(none)",
        format_size(result.index.extensionless_bytes()),
        result.index.extensionless_files()
    );
    println!();
    print_skips(&result);

    Ok(())
}

#[derive(Serialize)]
struct CleanOutput<'a> {
    candidates: &'a [DeleteCandidate],
    dry_run: bool,
    selected: Vec<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletion: Option<DeletionReport>,
}

fn run_clean(
    config: &ScanConfig,
    delete: &[usize],
    mode: DeleteMode,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    let result = run_scan(config)?;
    let candidates = &result.candidates;

    let mut chosen: Vec<&DeleteCandidate> = Vec::with_capacity(delete.len());
    for &n in delete {
        match n.checked_sub(1).and_then(|i| candidates.get(i)) {
            Some(candidate) if !chosen.iter().any(|c| std::ptr::eq(*c, candidate)) => {
                chosen.push(candidate)
            }
            Some(_) => {}
            None => bail!(
                "No candidate number {n}: choose between 1 and {}",
                candidates.len()
            ),
        }
    }
    let selected: Vec<&Path> = chosen.iter().map(|c| c.record.path.as_path()).collect();

    if format == OutputFormat::Text {
        print_candidates(candidates, config.stale_threshold_days);
    }

    let deletion = if !selected.is_empty() && yes {
        Some(delete_selected(&selected, mode, format)?)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let output = CleanOutput {
                candidates,
                dry_run: !yes,
                selected,
                deletion,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if let Some(report) = &deletion {
                let msg = if report.is_success() {
                    format!(
                        "Deleted {} files, freed {}",
                        report.succeeded(),
                        format_size(report.bytes_freed)
                    )
                } else {
                    format!(
                        "Deleted {}, failed {} (freed {})",
                        report.succeeded(),
                        report.failed(),
                        format_size(report.bytes_freed)
                    )
                };
                println!(" {msg}");
            } else if !selected.is_empty() {
                let bytes: u64 = chosen.iter().map(|c| c.record.size).sum();
                println!(
                    " Dry run: would delete {} files ({}). Re-run with --yes to delete.",
                    selected.len(),
                    format_size(bytes)
                );
            }
            print_skips(&result);
        }
    }

    Ok(())
}

fn print_candidates(candidates: &[DeleteCandidate], threshold: i64) {
    println!();
    println!("{}", "─".repeat(80));
    println!(" Deletion Candidates (not accessed for more than {threshold} days)");
    println!("{}", "─".repeat(80));
    if candidates.is_empty() {
        println!(" No stale files found.");
    }
    for (i, candidate) in candidates.iter().enumerate() {
        let record = &candidate.record;
        println!(
            " {:>3}. {:>8.2} {:>10} {:>5}d  {}",
            i + 1,
            candidate.priority,
            format_size(record.size),
            record.staleness_days.unwrap_or_default(),
            record.path.display()
        );
    }
    println!();
}

/// Delete on a background task, reporting failures as they arrive.
fn delete_selected(paths: &[&Path], mode: DeleteMode, format: OutputFormat) -> Result<DeletionReport> {
    let items: Vec<PathBuf> = paths.iter().map(|p| p.to_path_buf()).collect();
    let runtime = tokio::runtime::Runtime::new().context("Cannot start async runtime")?;

    let report = runtime.block_on(async move {
        let mut rx = start_deletion(items, mode);
        let mut report = None;
        while let Some(event) = rx.recv().await {
            match event {
                DeletionEvent::Progress(p) => {
                    if let Some(current) = &p.current {
                        debug!(path = %current.display(), done = p.deleted + p.failed, total = p.total, "deleting");
                    }
                }
                DeletionEvent::Failed(err) => {
                    if format == OutputFormat::Text {
                        eprintln!(" {err}");
                    }
                }
                DeletionEvent::Complete(r) => report = Some(r),
            }
        }
        report
    });

    match report {
        Some(report) => Ok(report),
        None => bail!("Deletion task ended without a report"),
    }
}

fn run_export(config: &ScanConfig, output: Option<PathBuf>) -> Result<()> {
    let result = run_scan(config)?;
    let report = result.report(result.index.len(), 10);
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

fn print_skips(result: &ScanResult) {
    if !result.warnings.is_empty() {
        println!();
        println!(
            "{} entries skipped (run with -v for details)",
            result.warnings.len()
        );
        for warning in &result.warnings {
            info!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        }
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "blink",
            "clean",
            "/data",
            "--stale-days",
            "90",
            "-n",
            "5",
            "--size-weight",
            "1.5",
            "--exclude",
            "node_modules",
        ]);
        let Some(Command::Clean {
            path,
            stale_days,
            top,
            ..
        }) = cli.command
        else {
            panic!("expected clean");
        };
        let config = resolve_config(
            &cli.global,
            path,
            Some(CleanOverrides { stale_days, top }),
        )
        .unwrap();

        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.stale_threshold_days, 90);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.size_weight, 1.5);
        assert!(config.exclude_names.iter().any(|n| n == "node_modules"));
    }

    #[test]
    fn test_delete_list_parses() {
        let cli = parse(&["blink", "clean", "--delete", "1,3", "--yes"]);
        let Some(Command::Clean { delete, yes, .. }) = cli.command else {
            panic!("expected clean");
        };
        assert_eq!(delete, vec![1, 3]);
        assert!(yes);
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let cli = parse(&["blink", "/tmp", "--stale-weight=-1"]);
        assert!(resolve_config(&cli.global, cli.path, None).is_err());
    }

    #[test]
    fn test_config_file_without_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("blink.toml");
        std::fs::write(&file, "top_k = 7\nstale_threshold_days = 14\n").unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.top_k, 7);
        assert_eq!(config.stale_threshold_days, 14);
        assert_eq!(config.root, default_root());
    }

    #[test]
    fn test_truncate_and_bar() {
        assert_eq!(truncate(".verylongextension", 6), ".very…");
        assert_eq!(truncate(".rs", 6), ".rs");
        assert_eq!(make_bar(0.5, 4), "[██░░]");
        assert_eq!(make_bar(2.0, 2), "[██]");
    }
}
