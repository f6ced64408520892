//! Configuration handling.
//!
//! Settings come from an optional `lightavg.toml`, then the environment
//! (including a `.env` file), then the command line. Later sources win.

use crate::cli::{Args, Command};
use crate::error::{LightavgError, Result};
use crate::services::AveragingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "lightavg.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Overrides applied on top of [`AuditOptions::default`].
    #[serde(default)]
    pub audit: AuditOptionsOverride,

    #[serde(default)]
    pub lighthouse: LighthouseConfig,

    #[serde(default)]
    pub chrome: ChromeConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root of the job directories.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Audit ids aggregated into `auditStats.json`.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    #[serde(default)]
    pub averaging: AveragingMode,

    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            metrics: default_metrics(),
            averaging: AveragingMode::default(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_metrics() -> Vec<String> {
    vec![
        "first-contentful-paint",
        "largest-contentful-paint",
        "speed-index",
        "total-blocking-time",
        "cumulative-layout-shift",
        "interactive",
        "server-response-time",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// How the `lighthouse` binary is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LighthouseConfig {
    #[serde(default = "default_lighthouse_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_wait_for_load")]
    pub max_wait_for_load_ms: u64,
}

impl Default for LighthouseConfig {
    fn default() -> Self {
        Self {
            path: default_lighthouse_path(),
            max_wait_for_load_ms: default_max_wait_for_load(),
        }
    }
}

fn default_lighthouse_path() -> PathBuf {
    PathBuf::from("lighthouse")
}

fn default_max_wait_for_load() -> u64 {
    120_000
}

/// Headless Chrome shared by every audit of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeConfig {
    #[serde(default = "default_chrome_path")]
    pub path: PathBuf,

    #[serde(default = "default_chrome_flags")]
    pub flags: Vec<String>,

    /// Remote debugging port. 0 picks a free one.
    #[serde(default)]
    pub port: u16,

    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_ms: u64,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            path: default_chrome_path(),
            flags: default_chrome_flags(),
            port: 0,
            startup_timeout_ms: default_startup_timeout(),
        }
    }
}

fn default_chrome_path() -> PathBuf {
    PathBuf::from("google-chrome")
}

fn default_chrome_flags() -> Vec<String> {
    vec!["--headless".to_string()]
}

fn default_startup_timeout() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    Mobile,
    #[default]
    Desktop,
}

impl FormFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormFactor::Mobile => "mobile",
            FormFactor::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    #[default]
    Info,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenEmulation {
    pub mobile: bool,
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub disabled: bool,
}

impl Default for ScreenEmulation {
    fn default() -> Self {
        Self {
            mobile: false,
            width: 1440,
            height: 900,
            device_scale_factor: 1.0,
            disabled: false,
        }
    }
}

/// Options handed to the audit engine for every page of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditOptions {
    pub form_factor: FormFactor,
    pub screen_emulation: ScreenEmulation,
    pub log_level: LogLevel,
    pub output: Vec<OutputFormat>,
    pub only_categories: Vec<String>,
    /// Debugging port of the browser to attach to.
    pub port: Option<u16>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            form_factor: FormFactor::Desktop,
            screen_emulation: ScreenEmulation::default(),
            log_level: LogLevel::Info,
            output: vec![OutputFormat::Html, OutputFormat::Json],
            only_categories: ["performance", "accessibility", "best-practices", "seo"]
                .into_iter()
                .map(String::from)
                .collect(),
            port: None,
        }
    }
}

/// Caller-supplied audit options. Every field that is set wins over the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditOptionsOverride {
    #[serde(default)]
    pub form_factor: Option<FormFactor>,
    #[serde(default)]
    pub screen_emulation: Option<ScreenEmulation>,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub output: Option<Vec<OutputFormat>>,
    #[serde(default)]
    pub only_categories: Option<Vec<String>>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl AuditOptions {
    pub fn merge(self, overrides: AuditOptionsOverride) -> Self {
        Self {
            form_factor: overrides.form_factor.unwrap_or(self.form_factor),
            screen_emulation: overrides.screen_emulation.unwrap_or(self.screen_emulation),
            log_level: overrides.log_level.unwrap_or(self.log_level),
            output: overrides.output.unwrap_or(self.output),
            only_categories: overrides.only_categories.unwrap_or(self.only_categories),
            port: overrides.port.or(self.port),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LightavgError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            LightavgError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Loads `path` when given, otherwise `lightavg.toml` if it exists, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions::default().merge(self.audit.clone())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or through their
    /// environment variables) replace file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if args.verbose {
            self.general.verbose = true;
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }

        match &args.command {
            Command::Audit(audit) => {
                self.merge_metrics(audit.metrics.as_ref(), audit.mean);
                if let Some(ref path) = audit.chrome_path {
                    self.chrome.path = path.clone();
                }
                if let Some(ref path) = audit.lighthouse_path {
                    self.lighthouse.path = path.clone();
                }
                if let Some(form_factor) = audit.form_factor {
                    self.audit.form_factor = Some(form_factor);
                }
            }
            Command::Stats(stats) => {
                self.merge_metrics(stats.metrics.as_ref(), stats.mean);
            }
            Command::Serve(serve) => {
                if let Some(ref host) = serve.host {
                    self.viewer.host = host.clone();
                }
                if let Some(port) = serve.port {
                    self.viewer.port = port;
                }
            }
        }
    }

    fn merge_metrics(&mut self, metrics: Option<&Vec<String>>, mean: bool) {
        if let Some(metrics) = metrics {
            self.general.metrics = metrics.clone();
        }
        if mean {
            self.general.averaging = AveragingMode::Mean;
        }
    }
}
