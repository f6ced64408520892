//! Command-line interface argument parsing.

use crate::config::FormFactor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lightavg - batch Lighthouse audits with per-domain averages
///
/// Examples:
///   lightavg audit ./input.csv
///   lightavg audit ./input.csv --job-id nightly --metrics speed-index,interactive
///   lightavg stats 2024-05-01
///   lightavg serve --port 8000
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for lightavg.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE", env = "LIGHTAVG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory holding one sub-directory per job
    #[arg(long, global = true, value_name = "DIR", env = "LIGHTAVG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Audit every page of an input list and aggregate the results
    Audit(AuditArgs),

    /// Recompute auditStats.json from the pages stored in a job
    Stats(StatsArgs),

    /// Serve the stats viewer
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AuditArgs {
    /// Input list (`name,url` per line), or an existing job id
    ///
    /// Prompted for when omitted, defaulting to ./input.csv
    pub input: Option<String>,

    /// Job id, defaults to today's date (yyyy-mm-dd)
    #[arg(long, value_name = "ID")]
    pub job_id: Option<String>,

    /// Comma-separated audit ids to aggregate
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub metrics: Option<Vec<String>>,

    /// Use the arithmetic mean instead of the running pairwise average
    #[arg(long)]
    pub mean: bool,

    /// Device emulated by Lighthouse
    #[arg(long, value_enum)]
    pub form_factor: Option<FormFactor>,

    /// Chrome executable
    #[arg(long, value_name = "PATH", env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Lighthouse executable
    #[arg(long, value_name = "PATH", env = "LIGHTHOUSE_PATH")]
    pub lighthouse_path: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StatsArgs {
    /// Job to recompute
    pub job_id: String,

    /// Comma-separated audit ids to aggregate
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub metrics: Option<Vec<String>>,

    /// Use the arithmetic mean instead of the running pairwise average
    #[arg(long)]
    pub mean: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,
}
