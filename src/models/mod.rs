// src/models/mod.rs

pub mod api;
pub mod app;
pub mod lighthouse;

pub use api::StatsParams;
pub use app::AppState;
pub use lighthouse::{
    AggregateStats, AuditEntry, AuditResult, Category, DomainMetricSummary, RunnerResult,
};
