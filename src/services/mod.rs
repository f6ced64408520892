pub mod site_audit_service;

pub use site_audit_service::{
    aggregate, aggregate_with, recompute_stats, run_batch, run_job, AuditEngine, AveragingMode,
    BatchOutcome, BrowserSession, ChromeSession, JobSummary, LighthouseCli, PageOutcome,
};
