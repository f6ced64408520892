//! Batch Lighthouse audits with per-domain aggregate statistics and a small
//! viewer for the stored results.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{LightavgError, Result};
