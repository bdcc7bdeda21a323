//! watchwrap CLI - Command-line interface for watchwrap
//!
//! Commands:
//! - analyze: Run the pipeline over an export and write a JSON report
//! - validate: Report how many rows of an export were usable
//! - periods: List the period labels available for a granularity
//! - config: Print the default configuration

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use watchwrap::dataset::{ExportDataset, ExportDiagnostics};
use watchwrap::encoder::ReportEncoder;
use watchwrap::filter::{PeriodGranularity, PeriodSelection, VideoTypeFilter, ViewFilter};
use watchwrap::pipeline::WrappedProcessor;
use watchwrap::schema::LoadDiagnostics;
use watchwrap::{AnalysisConfig, ComputeError, PRODUCER_NAME, VERSION};

/// watchwrap - Behavioral analytics over video watch history exports
#[derive(Parser)]
#[command(name = "watchwrap")]
#[command(version = VERSION)]
#[command(about = "Turn a watch/search history export into viewing analytics", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an export and write a JSON report
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Include the enriched event table in the report
        #[arg(long)]
        events: bool,

        /// Write compact instead of pretty-printed JSON
        #[arg(long)]
        compact: bool,
    },

    /// Load an export and report dropped rows
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,

        /// Fail when any row was dropped
        #[arg(long)]
        strict: bool,
    },

    /// List available period labels
    Periods {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Period granularity
        #[arg(long, value_parser = str::parse::<PeriodGranularity>, default_value = "month")]
        granularity: PeriodGranularity,

        /// First year to include
        #[arg(long)]
        from_year: Option<i32>,

        /// Last year to include
        #[arg(long)]
        to_year: Option<i32>,
    },

    /// Print the default configuration as JSON
    Config,
}

#[derive(Args)]
struct InputArgs {
    /// Export zip archive containing watch-history.json and/or search-history.json
    #[arg(short, long, conflicts_with_all = ["watch", "search"])]
    archive: Option<PathBuf>,

    /// Watch history JSON file
    #[arg(long)]
    watch: Option<PathBuf>,

    /// Search history JSON file
    #[arg(long)]
    search: Option<PathBuf>,
}

#[derive(Args)]
struct SettingsArgs {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gap (seconds) above which a new short-form cluster starts
    #[arg(long)]
    gap_threshold_sec: Option<f64>,

    /// Idle gap (minutes) above which a new session starts
    #[arg(long)]
    idle_gap_min: Option<f64>,

    /// Fixed UTC offset (minutes) for calendar bucketing
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,
}

#[derive(Args)]
struct ViewArgs {
    /// First year to include
    #[arg(long)]
    from_year: Option<i32>,

    /// Last year to include
    #[arg(long)]
    to_year: Option<i32>,

    /// Video types to keep
    #[arg(long, value_parser = str::parse::<VideoTypeFilter>, default_value = "all")]
    video_type: VideoTypeFilter,

    /// Restrict to one calendar period
    #[arg(long, value_parser = str::parse::<PeriodGranularity>, default_value = "entire")]
    period: PeriodGranularity,

    /// Period label (e.g. 2024, 2024-03, 2024-03-04/2024-03-10); latest when omitted
    #[arg(long)]
    period_label: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), WatchwrapCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            settings,
            view,
            output,
            events,
            compact,
        } => cmd_analyze(&input, &settings, &view, &output, events, compact),
        Commands::Validate {
            input,
            json,
            strict,
        } => cmd_validate(&input, json, strict),
        Commands::Periods {
            input,
            settings,
            granularity,
            from_year,
            to_year,
        } => cmd_periods(&input, &settings, granularity, from_year, to_year),
        Commands::Config => cmd_config(),
    }
}

fn cmd_analyze(
    input: &InputArgs,
    settings: &SettingsArgs,
    view: &ViewArgs,
    output: &Path,
    events: bool,
    compact: bool,
) -> Result<(), WatchwrapCliError> {
    let dataset = load_dataset(input)?;
    let config = load_config(settings)?;
    let filter = build_filter(view)?;

    let mut encoder = ReportEncoder::new();
    if events {
        encoder = encoder.including_events();
    }
    let mut processor = WrappedProcessor::new(dataset, config)?.with_encoder(encoder);
    let report = processor.report(&filter)?;

    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    if output.to_string_lossy() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", json)?;
    } else {
        fs::write(output, json + "\n")?;
        info!(path = %output.display(), "Wrote report");
    }

    Ok(())
}

fn cmd_validate(input: &InputArgs, json: bool, strict: bool) -> Result<(), WatchwrapCliError> {
    let dataset = load_dataset(input)?;
    let diagnostics = dataset.diagnostics();

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        print_diagnostics(&diagnostics);
    }

    let dropped = diagnostics.dropped();
    if strict && dropped > 0 {
        Err(WatchwrapCliError::ValidationFailed(dropped))
    } else {
        Ok(())
    }
}

fn cmd_periods(
    input: &InputArgs,
    settings: &SettingsArgs,
    granularity: PeriodGranularity,
    from_year: Option<i32>,
    to_year: Option<i32>,
) -> Result<(), WatchwrapCliError> {
    let dataset = load_dataset(input)?;
    let config = load_config(settings)?;
    let filter = ViewFilter {
        year_range: year_range(from_year, to_year),
        ..ViewFilter::default()
    };

    let processor = WrappedProcessor::new(dataset, config)?;
    for label in processor.periods(granularity, &filter)? {
        println!("{}", label);
    }
    Ok(())
}

fn cmd_config() -> Result<(), WatchwrapCliError> {
    println!("{}", AnalysisConfig::default().to_json()?);
    Ok(())
}

fn load_dataset(input: &InputArgs) -> Result<ExportDataset, WatchwrapCliError> {
    let dataset = match (&input.archive, &input.watch, &input.search) {
        (Some(archive), _, _) => ExportDataset::open_archive(archive)?,
        (None, None, None) => return Err(WatchwrapCliError::NoInput),
        (None, watch, search) => ExportDataset::open_files(watch.as_deref(), search.as_deref())?,
    };
    Ok(dataset)
}

fn load_config(settings: &SettingsArgs) -> Result<AnalysisConfig, WatchwrapCliError> {
    let mut config = match &settings.config {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };

    if let Some(gap) = settings.gap_threshold_sec {
        config.classification.gap_threshold_sec = gap;
    }
    if let Some(idle) = settings.idle_gap_min {
        config.session.idle_gap_min = idle;
    }
    if let Some(offset) = settings.utc_offset_minutes {
        config.time.utc_offset_minutes = offset;
    }

    config.validate()?;
    Ok(config)
}

fn build_filter(view: &ViewArgs) -> Result<ViewFilter, WatchwrapCliError> {
    let granularity = view.period;
    let period = match (granularity, &view.period_label) {
        (PeriodGranularity::Entire, Some(_)) => {
            return Err(WatchwrapCliError::Usage(
                "--period-label needs --period year, month or week".to_string(),
            ))
        }
        (PeriodGranularity::Entire, None) => None,
        (granularity, label) => Some(PeriodSelection {
            granularity,
            label: label.clone(),
        }),
    };

    let filter = ViewFilter {
        year_range: year_range(view.from_year, view.to_year),
        video_type: view.video_type,
        period,
    };
    filter.validate()?;
    Ok(filter)
}

/// Open-ended bounds extend to every year
fn year_range(from: Option<i32>, to: Option<i32>) -> Option<(i32, i32)> {
    match (from, to) {
        (None, None) => None,
        (from, to) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
    }
}

fn print_diagnostics(diagnostics: &ExportDiagnostics) {
    println!("Validation Report");
    println!("=================");
    print_file("watch-history.json", diagnostics.watch_history.as_ref());
    print_file("search-history.json", diagnostics.search_history.as_ref());
    println!("Dropped rows:      {}", diagnostics.dropped());
}

fn print_file(name: &str, diagnostics: Option<&LoadDiagnostics>) {
    println!("\n{}", name);
    match diagnostics {
        None => println!("  not present"),
        Some(d) => {
            println!("  Total records:     {}", d.total_records);
            println!("  Kept:              {}", d.kept);
            println!("  Excluded (ads):    {}", d.excluded_details);
            println!("  Malformed record:  {}", d.malformed_record);
            println!("  Invalid timestamp: {}", d.invalid_timestamp);
            println!("  Missing title:     {}", d.missing_title);
        }
    }
}

// Error types

#[derive(Debug)]
enum WatchwrapCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoInput,
    Usage(String),
    ValidationFailed(usize),
}

impl From<io::Error> for WatchwrapCliError {
    fn from(e: io::Error) -> Self {
        WatchwrapCliError::Io(e)
    }
}

impl From<ComputeError> for WatchwrapCliError {
    fn from(e: ComputeError) -> Self {
        WatchwrapCliError::Compute(e)
    }
}

impl From<serde_json::Error> for WatchwrapCliError {
    fn from(e: serde_json::Error) -> Self {
        WatchwrapCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WatchwrapCliError> for CliError {
    fn from(e: WatchwrapCliError) -> Self {
        match e {
            WatchwrapCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WatchwrapCliError::Compute(e) => compute_error(e),
            WatchwrapCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            WatchwrapCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No export given".to_string(),
                hint: Some("Pass --archive, or --watch and/or --search".to_string()),
            },
            WatchwrapCliError::Usage(msg) => CliError {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: Some(format!("Run '{} --help' for usage", PRODUCER_NAME)),
            },
            WatchwrapCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows were dropped while loading", count),
                hint: Some("Run without --strict to see the full report".to_string()),
            },
        }
    }
}

fn compute_error(e: ComputeError) -> CliError {
    let (code, hint) = match &e {
        ComputeError::ParseError(_) => (
            "PARSE_ERROR",
            Some("History files must be JSON arrays of activity records"),
        ),
        ComputeError::JsonError(_) => ("JSON_ERROR", Some("Check JSON syntax")),
        ComputeError::ArchiveError(_) => ("ARCHIVE_ERROR", Some("Ensure the archive is a valid zip")),
        ComputeError::IoError(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        ComputeError::InvalidConfig(_) => (
            "INVALID_CONFIG",
            Some("Run 'watchwrap config' to see valid settings"),
        ),
        ComputeError::MissingInput(_) => (
            "MISSING_INPUT",
            Some("The archive must contain watch-history.json or search-history.json"),
        ),
        ComputeError::NoData(_) => ("NO_DATA", Some("Widen the year range or period")),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: hint.map(str::to_string),
    }
}
