pub mod stats;

pub use stats::{aggregate, aggregate_with, round_to, AveragingMode};
