pub mod batch;
pub mod browser;
pub mod lighthouse;

pub use batch::{recompute_stats, run_batch, run_job, BatchOutcome, JobSummary, PageOutcome};
pub use browser::{BrowserSession, ChromeSession};
pub use lighthouse::{AuditEngine, LighthouseCli};
