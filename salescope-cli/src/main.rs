use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use salescope_core::{AnalysisOptions, InsightBundle, RawTable, analyze};
use salescope_ingest::{read_csv_path, sample_table};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod report;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SALESCOPE_BUILD_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "salescope",
    version,
    long_version = LONG_VERSION,
    about = "Monthly sales aggregation and forecasting"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.salescope/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a sales CSV (columns: Date, Sales, Product, Region, Customer ID)
    Analyze {
        /// Path to the sales CSV
        #[arg(long)]
        csv: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Override the date format (chrono syntax, default: %Y-%m-%d)
        #[arg(long)]
        date_format: Option<String>,
    },

    /// Analyze the built-in sample dataset
    Sample {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Print the insight bundle as JSON
    #[arg(long)]
    json: bool,

    /// Rows printed per ranking table
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = config::config_path(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            csv,
            output,
            date_format,
        } => {
            if !csv.exists() {
                bail!("CSV not found: {} (pass --csv <path>)", csv.display());
            }
            let cfg = config::load_config(&config_path)?;
            let mut options = cfg.analysis_options();
            if let Some(format) = date_format {
                options.normalize.date_format = format;
            }

            let table = read_csv_path(&csv)?;
            info!(path = %csv.display(), rows = table.rows.len(), "loaded sales table");
            let bundle = run_analysis(table, options)
                .await
                .with_context(|| format!("analyzing {}", csv.display()))?;
            print_bundle(&bundle, &output, &cfg)?;
        }

        Command::Sample { output } => {
            let cfg = config::load_config(&config_path)?;
            let table = sample_table()?;
            let bundle = run_analysis(table, cfg.analysis_options()).await?;
            print_bundle(&bundle, &output, &cfg)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&config_path)?,
            ConfigCommand::Show => show_config(&config_path)?,
        },
    }

    Ok(())
}

/// Run the pipeline on a blocking worker and hand the finished bundle back.
async fn run_analysis(table: RawTable, options: AnalysisOptions) -> Result<InsightBundle> {
    let bundle = tokio::task::spawn_blocking(move || analyze(&table, &options))
        .await
        .context("analysis worker stopped")??;
    Ok(bundle)
}

fn print_bundle(bundle: &InsightBundle, output: &OutputArgs, cfg: &config::Config) -> Result<()> {
    if output.json || cfg.report.json {
        println!("{}", serde_json::to_string_pretty(bundle)?);
    } else {
        let limit = output.limit.unwrap_or(cfg.report.limit);
        print!("{}", report::render_report(bundle, limit));
    }
    Ok(())
}

fn show_config(path: &Path) -> Result<()> {
    let cfg = config::load_config(path)?;
    let state = if path.exists() { "" } else { " (not found, defaults)" };
    println!("# {}{}", path.display(), state);
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
