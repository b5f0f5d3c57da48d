#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the road accident severity pipeline.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use road_severity_cli_utils::TrainingProgress;
use road_severity_model::importance::DEFAULT_TOP_K;
use road_severity_model::{EvaluationParams, ForestParams};
use road_severity_pipeline::PipelineConfig;
use road_severity_pipeline::config::{DEFAULT_IMPORTANCE_OUTPUT, DEFAULT_OUTPUT, DEFAULT_YEAR};

#[derive(Parser)]
#[command(
    name = "road_severity",
    about = "Road accident severity analysis: download, train, evaluate and export",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (default)
    Run(RunArgs),
    /// Download and extract the yearly dataset, then print the CSV path
    Fetch {
        /// Analysis year
        #[arg(long, default_value_t = DEFAULT_YEAR)]
        year: i32,
        /// Dataset URL (falls back to `ROAD_SEVERITY_DATASET_URL`, then the
        /// built-in default)
        #[arg(long)]
        url: Option<String>,
        /// Directory for the archive and extracted CSV
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
    },
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Analysis year
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: i32,
    /// Enriched table output (`.xlsx`, falls back to `.csv`)
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Local `.csv` or `.zip` to use instead of downloading
    #[arg(long)]
    input: Option<PathBuf>,
    /// Dataset URL (falls back to `ROAD_SEVERITY_DATASET_URL`, then the
    /// built-in default)
    #[arg(long)]
    url: Option<String>,
    /// Directory for temporary files
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
    /// Feature importance CSV output
    #[arg(long, default_value = DEFAULT_IMPORTANCE_OUTPUT)]
    importance_output: PathBuf,
    /// Number of features in the printed importance summary
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Trees in the random forest
    #[arg(long, default_value_t = 100)]
    trees: usize,
    /// Seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.3)]
    test_fraction: f64,
    /// Write the classification report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the downloaded archive and extracted CSV
    #[arg(long)]
    keep_temp: bool,
}

impl From<RunArgs> for PipelineConfig {
    fn from(args: RunArgs) -> Self {
        Self {
            year: args.year,
            input: args.input,
            url: args.url,
            work_dir: args.work_dir,
            output: args.output,
            importance_output: args.importance_output,
            report: args.report,
            top_k: args.top_k,
            forest: ForestParams {
                n_trees: args.trees,
                seed: args.seed,
                ..ForestParams::default()
            },
            evaluation: EvaluationParams {
                test_fraction: args.test_fraction,
                seed: args.seed,
            },
            keep_temp: args.keep_temp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = road_severity_cli_utils::init_logger();
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Commands::Fetch {
            year,
            url,
            work_dir,
        }) => {
            let config = PipelineConfig {
                year,
                url,
                work_dir,
                ..PipelineConfig::default()
            };
            let acquired = road_severity_pipeline::acquire::acquire(&config).await?;
            println!("{}", acquired.csv.display());
            return Ok(());
        }
        Some(Commands::Run(args)) => args,
        None => cli.run,
    };

    let config = PipelineConfig::from(args);
    let start = Instant::now();

    let progress = TrainingProgress::new(&multi, "Preparing data");
    let (analysis, artifacts) = road_severity_pipeline::run(&config, &progress).await?;

    println!();
    println!(
        "Classification report ({} train / {} test rows):",
        analysis.train_size, analysis.test_size
    );
    println!("{}", analysis.report);
    print!(
        "{}",
        road_severity_pipeline::format_top_features(&analysis.ranking, config.top_k)
    );
    println!();
    println!("Enriched table: {}", artifacts.table.display());
    println!("Feature importances: {}", artifacts.importances.display());
    if let Some(report) = &artifacts.report {
        println!("Report: {}", report.display());
    }

    log::info!(
        "Pipeline complete in {:.1}s ({} rows dropped by normalization)",
        start.elapsed().as_secs_f64(),
        analysis.dropped_rows
    );

    Ok(())
}
