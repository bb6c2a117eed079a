//! # Beam Report CLI
//!
//! Command-line host for `beam_core`: reads a load or series table,
//! runs the analysis and emits the result JSON consumed by the report
//! renderer. A human-readable summary goes to stderr so stdout stays
//! machine-readable.

use std::path::PathBuf;
use std::process::ExitCode;

use beam_core::calculations::BeamAnalysisResult;
use beam_core::file_io::{load_settings, load_table, save_result};
use beam_core::{analyze, AnalysisSettings, CalcError, CalcResult};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "beam_cli",
    version,
    about = "Shear and moment diagrams for a simply-supported beam"
)]
struct Cli {
    /// Input table (.csv, .json, or a spreadsheet such as .xlsx)
    input: PathBuf,

    /// Beam span; defaults to the largest position in the table
    #[arg(short, long, env = "BEAM_LENGTH")]
    length: Option<f64>,

    /// Settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Write the result JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the summary on stderr
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> CalcResult<BeamAnalysisResult> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => AnalysisSettings::default(),
    };
    let table = load_table(&cli.input)?;
    let result = analyze(&table, cli.length, &settings)?;

    match &cli.output {
        Some(path) => save_result(&result, path)?,
        None => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CalcError::serialization(e.to_string()))?;
            println!("{}", json);
        }
    }
    Ok(result)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(result) => {
            if !cli.quiet {
                print_summary(&result);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "analysis failed");
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            if e.is_input_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn print_summary(result: &BeamAnalysisResult) {
    let meta = &result.metadata;
    let s = &meta.summary;

    eprintln!("═══════════════════════════════════════");
    eprintln!("  BEAM ANALYSIS ({})", result.mode);
    eprintln!("═══════════════════════════════════════");
    eprintln!();
    eprintln!("Input:");
    for (role, column) in &meta.column_mapping.columns {
        eprintln!("  {:<9} <- {}", role.name(), column.header);
    }
    eprintln!(
        "  Length:   {:.3}{}",
        meta.length,
        if meta.length_assumed { " (assumed)" } else { "" }
    );
    if let Some((r0, rl)) = result.reactions() {
        eprintln!();
        eprintln!("Reactions:");
        eprintln!("  R0 = {:.3}", r0);
        eprintln!("  RL = {:.3}", rl);
    }
    eprintln!();
    eprintln!("Extremes:");
    eprintln!("  V_max = {:.3} at x = {:.3}", s.max_shear.value, s.max_shear.x);
    eprintln!("  V_min = {:.3} at x = {:.3}", s.min_shear.value, s.min_shear.x);
    eprintln!("  M_max = {:.3} at x = {:.3}", s.max_moment.value, s.max_moment.x);
    eprintln!("  M_min = {:.3} at x = {:.3}", s.min_moment.value, s.min_moment.x);
    eprintln!();
    eprintln!("  {} points", meta.sample_count);

    for note in meta.assumptions.iter().chain(&meta.warnings) {
        eprintln!("  [NOTE] {}", note);
    }
    eprintln!("═══════════════════════════════════════");
}
