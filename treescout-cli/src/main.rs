use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use treescout::{
    CancellationToken, EntryKind, ErrorAction, ErrorPolicy, FileRecord, MatchMode, RuleChain,
    SearchError, SearchJob, SearchObserver, SearchSettings, SearchSummary, Severity,
};

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchArgs {
    /// Pattern matched against entry names (glob unless --name-regex)
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Treat the name pattern as a regular expression
    #[arg(long)]
    name_regex: bool,

    /// Pattern matched against file contents (glob unless --content-regex)
    #[arg(short = 'c', long = "content")]
    content: Option<String>,

    /// Treat the content pattern as a regular expression
    #[arg(long)]
    content_regex: bool,

    /// Only entries of this MIME type (e.g. text/plain)
    #[arg(short = 't', long = "type")]
    mime_type: Option<String>,

    /// Minimum size in bytes (inclusive)
    #[arg(long)]
    min_size: Option<u64>,

    /// Maximum size in bytes (inclusive)
    #[arg(long)]
    max_size: Option<u64>,

    /// Match patterns case-sensitively
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Fold case when matching, overriding the config file
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// Only search the top level of each directory
    #[arg(long)]
    no_recursive: bool,

    /// Descend into subdirectories, overriding the config file
    #[arg(long, conflicts_with = "no_recursive")]
    recursive: bool,

    /// Include hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Skip hidden files and directories, overriding the config file
    #[arg(long, conflicts_with = "hidden")]
    no_hidden: bool,

    /// Largest file to scan for content, in bytes (0 for unlimited)
    #[arg(long)]
    max_scan_size: Option<u64>,

    /// What to do when a folder or file cannot be read
    #[arg(long, value_enum, default_value = "continue")]
    on_error: OnError,

    /// Stop after this many matches (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,

    /// Print one JSON object per match
    #[arg(long)]
    json: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Directories to search (can be specified multiple times)
    #[arg(short = 'd', long = "dir", default_value = ".")]
    dirs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search directories for matching entries
    Search(Box<CliSearchArgs>),

    /// Print the effective configuration
    Config {
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnError {
    Continue,
    AbortOnSevere,
    Abort,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Continue => ErrorPolicy::Continue,
            OnError::AbortOnSevere => ErrorPolicy::AbortOnSevere,
            OnError::Abort => ErrorPolicy::Abort,
        }
    }
}

/// Applies the error policy and cancels the job once `limit` matches are in
struct CliObserver {
    policy: ErrorPolicy,
    limit: Option<u64>,
    matched: AtomicU64,
    cancel: CancellationToken,
}

impl SearchObserver for CliObserver {
    fn report(&self, error: &SearchError, severity: Severity) -> ErrorAction {
        self.policy.report(error, severity)
    }

    fn entry_matched(&self, _record: &FileRecord) {
        let matched = self.matched.fetch_add(1, Ordering::SeqCst) + 1;
        if self.limit.is_some_and(|limit| matched >= limit) {
            debug!("Match limit reached after {} matches", matched);
            self.cancel.cancel();
        }
    }
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => {
            let settings = apply_overrides(
                load_settings(args.config.as_ref())?.merge_with_cli(cli_settings(&args)),
                &args,
            );
            init_logging(&settings.log_level);
            debug!("Effective settings: {:?}", settings);

            let rules = RuleChain::standard(&settings);
            let job = SearchJob::new(rules, args.dirs.as_slice(), &settings)?;
            let cancel = job.cancellation_token();
            let job = job.with_observer(CliObserver {
                policy: args.on_error.into(),
                limit: args.limit,
                matched: AtomicU64::new(0),
                cancel,
            });

            let (records, summary) = run_with_spinner(job, args.json)?;
            if args.json {
                print_json(&records)?;
            } else {
                print_records(&records, &summary);
            }
            Ok(())
        }
        Commands::Config { config } => {
            let settings = load_settings(config.as_ref())?;
            print!("{}", settings.to_yaml()?);
            Ok(())
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<SearchSettings> {
    SearchSettings::load_from(path.map(PathBuf::as_path))
        .map_err(|e| SearchError::config_error(e.to_string()))
}

fn cli_settings(args: &CliSearchArgs) -> SearchSettings {
    let defaults = SearchSettings::default();
    let mode = |regex: bool| if regex { MatchMode::Regex } else { MatchMode::Glob };

    SearchSettings {
        name_pattern: args.name.clone(),
        name_mode: mode(args.name_regex),
        content_pattern: args.content.clone(),
        content_mode: mode(args.content_regex),
        mime_type: args.mime_type.clone(),
        min_size: args.min_size,
        max_size: args.max_size,
        case_sensitive: args.case_sensitive,
        recursive: !args.no_recursive,
        show_hidden: args.hidden,
        max_scan_size: match args.max_scan_size {
            None => defaults.max_scan_size,
            Some(0) => None,
            Some(limit) => Some(limit),
        },
        log_level: args.log_level.clone().unwrap_or(defaults.log_level),
    }
}

/// Flags that turn a boolean back off after a config file turned it on
fn apply_overrides(mut settings: SearchSettings, args: &CliSearchArgs) -> SearchSettings {
    if args.ignore_case {
        settings.case_sensitive = false;
    }
    if args.recursive {
        settings.recursive = true;
    }
    if args.no_hidden {
        settings.show_hidden = false;
    }
    settings
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs the job on a worker thread, ticking a spinner with the live match
/// count until it finishes
fn run_with_spinner(job: SearchJob, quiet: bool) -> Result<(Vec<FileRecord>, SearchSummary)> {
    let results = job.results();
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let worker = thread::spawn(move || job.run());
    while !worker.is_finished() {
        spinner.set_message(format!("{} matches", results.len()));
        thread::sleep(Duration::from_millis(50));
    }
    spinner.finish_and_clear();

    let summary = worker
        .join()
        .map_err(|_| SearchError::IoError(io::Error::new(io::ErrorKind::Other, "search worker panicked")))?;
    Ok((results.snapshot(), summary))
}

fn print_json(records: &[FileRecord]) -> Result<()> {
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| SearchError::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        println!("{}", line);
    }
    Ok(())
}

fn print_records(records: &[FileRecord], summary: &SearchSummary) {
    for record in records {
        let path = record.path.display().to_string();
        match record.kind {
            EntryKind::Directory => println!("{}/", path.blue()),
            EntryKind::Symlink => println!("{}", path.cyan()),
            _ => println!("{} {}", path, format!("({} bytes)", record.size).dimmed()),
        }
    }

    let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);
    let status = if summary.cancelled {
        "stopped early".yellow()
    } else {
        "done".green()
    };
    println!(
        "\nFound {} matches in {} folders ({} errors) in {}, {}",
        summary.matches,
        summary.folders_walked,
        summary.errors_reported,
        humantime::format_duration(elapsed),
        status
    );
}
