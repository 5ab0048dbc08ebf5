use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod config;
mod pipeline;

use config::{Config, DEFAULT_CONFIG_FILE};
use pipeline::RunPlan;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STMTFLAG_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "stmtflag",
    version,
    long_version = LONG_VERSION,
    about = "Flag large DD/RTGS movements and watched names in HDFC/ICICI statement PDFs"
)]
struct Cli {
    /// Config file (default: ./stmtflag.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter, e.g. "debug" or "stmt_ingest=trace" (RUST_LOG wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, flag and write CSVs, chart and PDF report
    Run {
        /// Statement PDF
        #[arg(long)]
        pdf: PathBuf,

        /// Output directory (default from config: output)
        #[arg(long)]
        outdir: Option<PathBuf>,

        /// Submitter name printed on the report
        #[arg(long)]
        name: Option<String>,

        /// Submitter email printed on the report
        #[arg(long)]
        email: Option<String>,

        /// Skip the timeline chart
        #[arg(long)]
        no_chart: bool,
    },

    /// Detect layout and extract, then print a JSON summary. Writes nothing.
    Inspect {
        #[arg(long)]
        pdf: PathBuf,
    },

    /// Write the default config file
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = real_main(cli) {
        if tracing::dispatcher::has_been_set() {
            error!("{e:#}");
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            pdf,
            outdir,
            name,
            email,
            no_chart,
        } => {
            let cfg = setup(cli.config.as_deref(), cli.log_level.as_deref())?;
            let mut plan = RunPlan::from_config(&cfg);
            if let Some(outdir) = outdir {
                plan.outdir = outdir;
            }
            if let Some(name) = name {
                plan.name = name;
            }
            if let Some(email) = email {
                plan.email = email;
            }
            if no_chart {
                plan.chart = false;
            }

            let summary = pipeline::run(&pdf, &plan)?;
            println!(
                "{} statement: {} transactions ({} rows skipped)",
                summary.layout.bank_name(),
                summary.transactions,
                summary.skipped
            );
            println!(
                "Flags: DD large withdrawal={} | RTGS large deposit={} | watched entity={}",
                summary.flags.dd_large_withdrawal, summary.flags.rtgs_large_deposit, summary.flags.entities
            );
            println!("Report: {} page(s)", summary.report_pages);
            for p in &summary.written {
                println!("Wrote {}", p.display());
            }
        }

        Command::Inspect { pdf } => {
            setup(cli.config.as_deref(), cli.log_level.as_deref())?;
            let summary = pipeline::inspect(&pdf)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::InitConfig { path } => {
            config::init_config(&path)?;
        }
    }

    Ok(())
}

fn setup(config_path: Option<&Path>, cli_level: Option<&str>) -> Result<Config> {
    let cfg = config::load_config(config_path)?;
    init_logging(cli_level, &cfg)?;
    Ok(cfg)
}

/// Logs go to stderr so `inspect` output stays machine-readable.
fn init_logging(cli_level: Option<&str>, cfg: &Config) -> Result<()> {
    let level = cli_level.unwrap_or(cfg.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let layer = if cfg.logging.json {
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

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))
}
