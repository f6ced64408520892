use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use lightavg::api;
use lightavg::cli::{Args, AuditArgs, Command};
use lightavg::config::Config;
use lightavg::models::AppState;
use lightavg::services::{recompute_stats, run_job, ChromeSession, JobSummary, LighthouseCli};
use lightavg::utils::{default_job_id, init_logging, read_audit_source, ReportStore};
use log::{info, warn};
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_INPUT: &str = "./input.csv";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    config.merge_with_args(&args);
    init_logging(config.general.verbose);

    let store = ReportStore::new(&config.general.output_dir);

    match args.command {
        Command::Audit(audit) => audit_command(audit, &config, &store).await,
        Command::Stats(stats) => stats_command(&stats.job_id, &config, &store).await,
        Command::Serve(_) => api::serve(&config.viewer, AppState::new(store))
            .await
            .context("Viewer stopped"),
    }
}

async fn audit_command(audit: AuditArgs, config: &Config, store: &ReportStore) -> Result<()> {
    let input = match audit.input {
        Some(input) => input,
        None => prompt_input()?,
    };

    // The positional argument doubles as a job id.
    if !Path::new(&input).is_file() && store.job_exists(&input).await {
        info!("{} is an existing job, recomputing its stats", input);
        return stats_command(&input, config, store).await;
    }

    let pages = read_audit_source(Path::new(&input))
        .await
        .with_context(|| format!("Failed to read input list {}", input))?;
    if pages.is_empty() {
        warn!("No pages to audit in {}", input);
        return Ok(());
    }

    let job_id = audit.job_id.unwrap_or_else(default_job_id);
    info!("Auditing {} pages into job {}", pages.len(), job_id);

    let browser = ChromeSession::launch(&config.chrome)
        .await
        .context("Failed to launch Chrome")?;
    let engine = LighthouseCli::new(&config.lighthouse);

    let summary = run_job(&engine, browser, &pages, config, store, &job_id).await?;
    report(&summary);
    Ok(())
}

async fn stats_command(job_id: &str, config: &Config, store: &ReportStore) -> Result<()> {
    let summary = recompute_stats(
        store,
        job_id,
        &config.general.metrics,
        config.general.averaging,
    )
    .await
    .with_context(|| format!("Failed to recompute stats for job {}", job_id))?;
    report(&summary);
    Ok(())
}

fn report(summary: &JobSummary) {
    info!(
        "Job {}: {} pages aggregated, {} failed, {} domains -> {}",
        summary.job_id,
        summary.completed,
        summary.failed,
        summary.stats.len(),
        summary.stats_path.display()
    );
}

fn prompt_input() -> Result<String> {
    print!("Input file [{}]: ", DEFAULT_INPUT);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();

    Ok(if line.is_empty() {
        DEFAULT_INPUT.to_string()
    } else {
        line.to_string()
    })
}
