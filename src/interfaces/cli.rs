use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::use_cases::drift_analyzer::{analyze_transcript, compare_signals};
use crate::application::{ReadinessPipelineUseCase, ReportInput, ReportRequest};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::reporting::{build_drift_report, save_markdown_report};

#[derive(Debug, Parser)]
#[command(
    name = "readiness_gate",
    about = "Deterministic release readiness score, markdown report and LLM drift checks (no LLM judging)",
    version
)]
pub struct Cli {
    /// Configuration file (defaults to ./readiness.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score a test run and write the markdown readiness report.
    Report(ReportArgs),

    /// Compare a current transcript against a baseline.
    Drift(DriftArgs),

    /// Print the transcript signals and metrics as JSON.
    Signals(SignalsArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Run with built-in demo data (no input files).
    #[arg(long, conflicts_with_all = ["cases", "results"])]
    pub demo: bool,

    /// Test cases CSV.
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Test results: JUnit XML (`.xml`), JSON or CSV.
    #[arg(long, visible_alias = "junit")]
    pub results: Option<PathBuf>,

    /// Run history JSON for stability and regression signals.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// AI-agent artifacts JSON (conversations, intents, flows).
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// LLM transcript JSON for the advisory stability section.
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Baseline transcript JSON to compute drift against.
    #[arg(long, requires = "transcript")]
    pub baseline_transcript: Option<PathBuf>,

    /// Output markdown path (defaults to output.report_path).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DriftArgs {
    #[arg(long)]
    pub baseline: PathBuf,

    #[arg(long)]
    pub current: PathBuf,

    /// Output path (defaults to output.drift_report_path).
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DriftFormat::Markdown)]
    pub format: DriftFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriftFormat {
    Markdown,
    Json,
}

#[derive(Debug, Args)]
pub struct SignalsArgs {
    #[arg(long)]
    pub transcript: PathBuf,
}

pub fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    match cli.command {
        Commands::Report(args) => run_report(args, config),
        Commands::Drift(args) => run_drift(args, config),
        Commands::Signals(args) => run_signals(args),
    }
}

fn run_report(args: ReportArgs, config: &AppConfig) -> Result<()> {
    let input = report_input(&args)?;
    let request = ReportRequest {
        input,
        history: args.history,
        artifacts: args.artifacts,
        transcript: args.transcript,
        baseline_transcript: args.baseline_transcript,
        out: args
            .out
            .unwrap_or_else(|| PathBuf::from(&config.output.report_path)),
    };
    let saved = ReadinessPipelineUseCase::new(config.clone()).execute(&request)?;
    println!("OK: saved report to {}", saved.display());
    Ok(())
}

fn report_input(args: &ReportArgs) -> Result<ReportInput> {
    match (&args.cases, &args.results) {
        _ if args.demo => Ok(ReportInput::Demo),
        (Some(cases), Some(results)) => Ok(ReportInput::Files {
            cases: cases.clone(),
            results: results.clone(),
        }),
        (Some(_), None) | (None, Some(_)) => Err(AppError::ValidationError(
            "--cases and --results must be provided together (or use --demo)".to_string(),
        )),
        (None, None) => Err(AppError::ValidationError(
            "No input mode selected. Use either --demo or --cases <csv> --results <xml|csv|json>"
                .to_string(),
        )),
    }
}

fn run_drift(args: DriftArgs, config: &AppConfig) -> Result<()> {
    let baseline = analyze_transcript(&args.baseline)?;
    let current = analyze_transcript(&args.current)?;
    let report = compare_signals(&baseline, &current);

    let content = match args.format {
        DriftFormat::Markdown => build_drift_report(&report),
        DriftFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.output.drift_report_path));
    save_markdown_report(&out, &content)?;
    println!("OK: saved report to {}", out.display());
    Ok(())
}

fn run_signals(args: SignalsArgs) -> Result<()> {
    let signals = analyze_transcript(&args.transcript)?;
    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}
