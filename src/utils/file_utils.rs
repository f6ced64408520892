use crate::error::{LightavgError, Result};
use crate::models::{AggregateStats, AuditResult, RunnerResult};
use chrono::Utc;
use futures::StreamExt;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_stream::wrappers::ReadDirStream;

pub const STATS_FILE: &str = "auditStats.json";
/// Page stems in the order they were first written, one per line.
pub const PAGE_ORDER_FILE: &str = "pageOrder.txt";

const STATS_STEM: &str = "auditStats";

/// Flat per-job file storage.
///
/// ```text
/// <root>/<jobId>/<pageName>.html
/// <root>/<jobId>/<pageName>.json
/// <root>/<jobId>/auditStats.json
/// <root>/<jobId>/pageOrder.txt
/// ```
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_job_id(job_id)?))
    }

    pub fn stats_path(&self, job_id: &str) -> Result<PathBuf> {
        Ok(self.job_dir(job_id)?.join(STATS_FILE))
    }

    /// Creates the job directory. Safe to call when it already exists.
    pub async fn create_job(&self, job_id: &str) -> Result<PathBuf> {
        let dir = self.job_dir(job_id)?;
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    pub async fn job_exists(&self, job_id: &str) -> bool {
        match self.job_dir(job_id) {
            Ok(dir) => fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Writes one file per rendered report of a page and records the page
    /// in the job's page order.
    pub async fn write_page(
        &self,
        job_id: &str,
        page_name: &str,
        result: &RunnerResult,
    ) -> Result<Vec<PathBuf>> {
        let stem = sanitize_filename(page_name);
        if stem == STATS_STEM {
            return Err(LightavgError::InvalidPageName(page_name.to_string()));
        }
        let dir = self.create_job(job_id).await?;

        let mut written = Vec::with_capacity(result.reports.len());
        for (format, body) in &result.reports {
            let path = dir.join(format!("{}.{}", stem, format.extension()));
            fs::write(&path, body).await?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        let order = read_page_order(&dir).await?;
        if !order.contains(&stem) {
            let mut manifest = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(PAGE_ORDER_FILE))
                .await?;
            manifest.write_all(format!("{}\n", stem).as_bytes()).await?;
        }

        Ok(written)
    }

    pub async fn write_stats(&self, job_id: &str, stats: &AggregateStats) -> Result<PathBuf> {
        self.create_job(job_id).await?;
        let path = self.stats_path(job_id)?;
        fs::write(&path, serde_json::to_vec_pretty(stats)?).await?;
        Ok(path)
    }

    pub async fn read_stats(&self, job_id: &str) -> Result<String> {
        let path = self.stats_path(job_id)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LightavgError::NotFound(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Job ids, most recent first for date-like ids.
    pub async fn list_jobs(&self) -> Result<Vec<String>> {
        let dir_stream = match fs::read_dir(&self.root).await {
            Ok(stream) => stream,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stream = ReadDirStream::new(dir_stream);
        let mut jobs = Vec::new();
        while let Some(entry) = stream.next().await {
            let entry = entry?;
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    jobs.push(name.to_string());
                }
            }
        }

        jobs.sort_by(|a, b| b.cmp(a));
        Ok(jobs)
    }

    /// Parses every stored per-page JSON report of a job, in the order the
    /// pages were written. Reports missing from the page order follow,
    /// sorted by name.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn load_page_results(&self, job_id: &str) -> Result<Vec<(String, AuditResult)>> {
        let dir = self.job_dir(job_id)?;
        let dir_stream = match fs::read_dir(&dir).await {
            Ok(stream) => stream,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(LightavgError::NotFound(dir)),
            Err(e) => return Err(e.into()),
        };

        let mut stream = ReadDirStream::new(dir_stream);
        let mut results = Vec::new();
        while let Some(entry) = stream.next().await {
            let path = entry?.path();
            let is_page_report = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != STATS_FILE);
            if !is_page_report {
                continue;
            }

            let buffer = fs::read(&path).await?;
            match serde_json::from_slice::<AuditResult>(&buffer) {
                Ok(result) => {
                    let page = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    results.push((page, result));
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        let positions: HashMap<String, usize> = read_page_order(&dir)
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, stem)| (stem, index))
            .collect();
        results.sort_by(|a, b| {
            let rank = |page: &str| positions.get(page).copied().unwrap_or(usize::MAX);
            rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.0.cmp(&b.0))
        });
        Ok(results)
    }
}

async fn read_page_order(dir: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(dir.join(PAGE_ORDER_FILE)).await {
        Ok(contents) => Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// File stem for a page that no other page of the batch uses.
///
/// Collisions after sanitizing, and the stem reserved for the stats file,
/// get a `-2`, `-3`, ... suffix.
pub fn unique_page_stem(page_name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_filename(page_name);
    let mut stem = base.clone();
    let mut suffix = 2;
    while stem == STATS_STEM || used.contains(&stem) {
        stem = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    used.insert(stem.clone());
    stem
}

/// Rejects ids that would escape the store root.
pub fn validate_job_id(job_id: &str) -> Result<&str> {
    let invalid = job_id.is_empty()
        || job_id == "."
        || job_id == ".."
        || job_id.contains(['/', '\\'])
        || job_id.contains('\0');
    if invalid {
        Err(LightavgError::InvalidJobId(job_id.to_string()))
    } else {
        Ok(job_id)
    }
}

pub fn sanitize_filename(name: &str) -> String {
    name.replace(
        |c: char| !c.is_alphanumeric() && !matches!(c, '.' | '-' | '_'),
        "_",
    )
}

/// Today's date (UTC) as `yyyy-mm-dd`.
pub fn default_job_id() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
