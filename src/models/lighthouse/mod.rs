pub mod audit;
pub mod category;
pub mod report;
pub mod stats;

pub use audit::AuditEntry;
pub use category::Category;
pub use report::{AuditResult, RunnerResult};
pub use stats::{AggregateStats, DomainMetricSummary, MetricStats};
