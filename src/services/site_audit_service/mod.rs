// src/services/site_audit_service/mod.rs

pub mod compute;
pub mod lighthouse;

pub use compute::{aggregate, aggregate_with, AveragingMode};
pub use lighthouse::{
    recompute_stats, run_batch, run_job, AuditEngine, BatchOutcome, BrowserSession, ChromeSession,
    JobSummary, LighthouseCli, PageOutcome,
};
