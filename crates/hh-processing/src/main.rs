//! CLI entry point for the HH preprocessing pipeline.

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use hh_processing::output::{output_dir_for, save_arrays};
use hh_processing::{DataError, FxRates, Pipeline, PipelineConfig, PipelineOutput};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "HH resume dataset preprocessing",
    long_about = "Turns a raw HH resume export (CSV) into x_data.npy and y_data.npy.\n\n\
                  The arrays are written next to the input file.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  hh-processing data/hh.csv\n\n  \
                  # Custom exchange rates\n  \
                  hh-processing data/hh.csv --fx-rates rates.json\n\n  \
                  # Preview without writing files\n  \
                  hh-processing data/hh.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to process
    input: PathBuf,

    /// JSON file with the currency table
    ///
    /// Format: {"reference": "RUB", "rates": {"USD": 90.0, ...}}
    #[arg(long)]
    fx_rates: Option<PathBuf>,

    /// Field delimiter of the input file
    #[arg(short, long, default_value_t = ',')]
    separator: char,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output a JSON summary to stdout instead of the human-readable one
    ///
    /// Disables all logs so stdout only contains JSON.
    #[arg(long)]
    json: bool,

    /// Run the pipeline but do not write the .npy files
    #[arg(long)]
    dry_run: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a Path,
    x_path: Option<PathBuf>,
    y_path: Option<PathBuf>,
    #[serde(flatten)]
    summary: hh_processing::RunSummary,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if let Err(e) = run(&args) {
        if args.json
            && let Some(data_error) = e.downcast_ref::<DataError>()
        {
            println!("{}", serde_json::json!({ "error": data_error }));
        }
        error!("Pipeline failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let pipeline = build_pipeline(args)?;
    let output = pipeline.run_detailed(&args.input)?;

    let saved = if args.dry_run {
        info!("Dry run: skipping .npy output");
        None
    } else {
        let dir = output_dir_for(&args.input);
        Some(
            save_arrays(&dir, &output.features, &output.target)
                .with_context(|| format!("Failed to write arrays to {}", dir.display()))?,
        )
    };

    if args.json {
        let (x_path, y_path) = saved.unzip();
        let report = JsonReport {
            input: &args.input,
            x_path,
            y_path,
            summary: output.summary(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(args, &output, saved.as_ref());
    }
    Ok(())
}

fn build_pipeline(args: &Args) -> Result<Pipeline> {
    let mut config_builder = PipelineConfig::builder().separator(args.separator);
    if let Some(path) = &args.fx_rates {
        let rates = FxRates::from_json_file(path)
            .with_context(|| format!("Failed to load exchange rates from {}", path.display()))?;
        info!("Using exchange rates from {}", rates.source);
        config_builder = config_builder.fx_rates(rates);
    }
    let config = config_builder.build()?;

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}",
                update.fraction() * 100.0,
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the command's result, not a log line.
fn print_human_readable_summary(
    args: &Args,
    output: &PipelineOutput,
    saved: Option<&(PathBuf, PathBuf)>,
) {
    let d = &output.diagnostics;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Input:  {} ({} rows)", args.input.display(), d.rows_loaded);
    println!(
        "Output: {} rows x {} features",
        output.features.nrows(),
        output.features.ncols()
    );
    match saved {
        Some((x, y)) => {
            println!("  X -> {}", x.display());
            println!("  y -> {}", y.display());
        }
        None => println!("  (dry run, nothing written)"),
    }
    println!();

    println!("Processing Summary:");
    println!(
        "  Rows: {} -> {} ({} dropped without usable salary)",
        d.rows_loaded,
        output.features.nrows(),
        d.rows_dropped
    );
    if !d.columns_dropped.is_empty() {
        println!("  Columns dropped: {}", d.columns_dropped.join(", "));
    }
    if !d.currency_counts.is_empty() {
        let counts: Vec<String> = d
            .currency_counts
            .iter()
            .map(|(code, n)| format!("{code}: {n}"))
            .collect();
        println!("  Currencies: {}", counts.join(", "));
    }
    if let Some(source) = &d.fx_rates_source {
        println!("  Exchange rates: {}", source);
    }
    if !d.dropped_salary_examples.is_empty() {
        println!("  Dropped salary examples:");
        for example in d.dropped_salary_examples.iter().take(5) {
            println!("    - {}", example);
        }
    }
    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
