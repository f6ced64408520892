use super::browser::BrowserSession;
use super::lighthouse::AuditEngine;
use crate::config::{AuditOptions, Config};
use crate::error::Result;
use crate::models::{AggregateStats, AuditResult};
use crate::services::site_audit_service::compute::{aggregate_with, AveragingMode};
use crate::utils::{sanitize_filename, unique_page_stem, AuditPage, ReportStore};
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum PageOutcome {
    Completed(AuditResult),
    Failed(String),
}

/// Per-page outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub pages: Vec<(String, PageOutcome)>,
}

impl BatchOutcome {
    pub fn completed(&self) -> impl Iterator<Item = (&str, &AuditResult)> {
        self.pages.iter().filter_map(|(name, outcome)| match outcome {
            PageOutcome::Completed(result) => Some((name.as_str(), result)),
            PageOutcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages.iter().filter_map(|(name, outcome)| match outcome {
            PageOutcome::Failed(reason) => Some((name.as_str(), reason.as_str())),
            PageOutcome::Completed(_) => None,
        })
    }

    pub fn results(&self) -> Vec<AuditResult> {
        self.completed().map(|(_, result)| result.clone()).collect()
    }
}

#[derive(Debug)]
pub struct JobSummary {
    pub job_id: String,
    pub completed: usize,
    pub failed: usize,
    pub stats_path: PathBuf,
    pub stats: AggregateStats,
}

/// Audits `pages` one after another against a single browser.
///
/// A failed page is logged and recorded; it never stops the batch. Pages
/// whose file names would collide are stored under a suffixed name. The
/// browser is closed exactly once after the last page, and a failure to
/// close it is only logged.
pub async fn run_batch<E, B>(
    engine: &E,
    browser: B,
    pages: &[AuditPage],
    options: &AuditOptions,
    store: &ReportStore,
    job_id: &str,
) -> BatchOutcome
where
    E: AuditEngine + ?Sized,
    B: BrowserSession,
{
    let options = options.clone().with_port(browser.port());
    let mut outcome = BatchOutcome::default();
    let mut used_stems = HashSet::new();

    for page in pages {
        let stem = unique_page_stem(&page.name, &mut used_stems);
        if stem != sanitize_filename(&page.name) {
            warn!(
                "Reports for {} are stored as {} to avoid overwriting another file",
                page.name, stem
            );
        }

        info!("Auditing {} ({})", page.name, page.url);
        match audit_page(engine, page, &stem, &options, store, job_id).await {
            Ok(result) => outcome
                .pages
                .push((page.name.clone(), PageOutcome::Completed(result))),
            Err(e) => {
                error!("Lighthouse produced no result for {}: {}", page.name, e);
                outcome
                    .pages
                    .push((page.name.clone(), PageOutcome::Failed(e.to_string())));
            }
        }
    }

    if let Err(e) = browser.close().await {
        error!("{}", e);
    }

    outcome
}

async fn audit_page<E>(
    engine: &E,
    page: &AuditPage,
    stem: &str,
    options: &AuditOptions,
    store: &ReportStore,
    job_id: &str,
) -> Result<AuditResult>
where
    E: AuditEngine + ?Sized,
{
    let result = engine.run_audit(&page.url, options).await?;
    store.write_page(job_id, stem, &result).await?;

    info!(
        "Report is done for {}",
        result.lhr.resolved_url().unwrap_or(&page.url)
    );
    match result.lhr.performance_score() {
        Some(score) => info!("Performance score was {}", score * 100.0),
        None => info!("Performance score was not available."),
    }

    Ok(result.lhr)
}

/// Runs a whole job: audits, per-page reports, then `auditStats.json`.
pub async fn run_job<E, B>(
    engine: &E,
    browser: B,
    pages: &[AuditPage],
    config: &Config,
    store: &ReportStore,
    job_id: &str,
) -> Result<JobSummary>
where
    E: AuditEngine + ?Sized,
    B: BrowserSession,
{
    if let Err(e) = store.create_job(job_id).await {
        if let Err(close_err) = browser.close().await {
            error!("{}", close_err);
        }
        return Err(e);
    }

    let outcome = run_batch(
        engine,
        browser,
        pages,
        &config.audit_options(),
        store,
        job_id,
    )
    .await;

    let failed = outcome.failed().count();
    if failed > 0 {
        warn!("{} of {} pages failed", failed, outcome.pages.len());
    }

    let results = outcome.results();
    let stats = aggregate_with(&results, &config.general.metrics, config.general.averaging);
    let stats_path = store.write_stats(job_id, &stats).await?;
    info!("Stats written to {}", stats_path.display());

    Ok(JobSummary {
        job_id: job_id.to_string(),
        completed: results.len(),
        failed,
        stats_path,
        stats,
    })
}

/// Rebuilds `auditStats.json` from the JSON reports already stored in a job.
pub async fn recompute_stats(
    store: &ReportStore,
    job_id: &str,
    metrics: &[String],
    mode: AveragingMode,
) -> Result<JobSummary> {
    let results: Vec<AuditResult> = store
        .load_page_results(job_id)
        .await?
        .into_iter()
        .map(|(_, result)| result)
        .collect();

    let stats = aggregate_with(&results, metrics, mode);
    let stats_path = store.write_stats(job_id, &stats).await?;
    info!(
        "Recomputed stats for {} pages into {}",
        results.len(),
        stats_path.display()
    );

    Ok(JobSummary {
        job_id: job_id.to_string(),
        completed: results.len(),
        failed: 0,
        stats_path,
        stats,
    })
}
