use crate::config::{AuditOptions, LighthouseConfig, LogLevel, OutputFormat};
use crate::error::{LightavgError, Result};
use crate::models::{AuditResult, RunnerResult};
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;

/// Runs one audit of one URL.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    async fn run_audit(&self, url: &str, options: &AuditOptions) -> Result<RunnerResult>;
}

/// [`AuditEngine`] backed by the `lighthouse` command-line tool, attached
/// to an already running browser through `options.port`.
#[derive(Debug, Clone)]
pub struct LighthouseCli {
    binary: PathBuf,
    max_wait_for_load_ms: u64,
}

impl LighthouseCli {
    pub fn new(config: &LighthouseConfig) -> Self {
        Self {
            binary: config.path.clone(),
            max_wait_for_load_ms: config.max_wait_for_load_ms,
        }
    }

    pub fn build_args(&self, url: &str, options: &AuditOptions, output_base: &Path) -> Vec<String> {
        let screen = &options.screen_emulation;
        let mut args = vec![
            url.to_string(),
            format!("--form-factor={}", options.form_factor.as_str()),
            format!("--screenEmulation.mobile={}", screen.mobile),
            format!("--screenEmulation.width={}", screen.width),
            format!("--screenEmulation.height={}", screen.height),
            format!("--screenEmulation.deviceScaleFactor={}", screen.device_scale_factor),
            format!("--screenEmulation.disabled={}", screen.disabled),
        ];

        if let Some(port) = options.port {
            args.push(format!("--port={}", port));
        }
        if !options.only_categories.is_empty() {
            args.push(format!("--only-categories={}", options.only_categories.join(",")));
        }
        for format in report_formats(options) {
            args.push(format!("--output={}", format.extension()));
        }
        args.push(format!("--output-path={}", output_base.display()));
        args.push(format!("--max-wait-for-load={}", self.max_wait_for_load_ms));
        args.push("--no-enable-error-reporting".to_string());

        match options.log_level {
            LogLevel::Silent | LogLevel::Error => args.push("--quiet".to_string()),
            LogLevel::Verbose => args.push("--verbose".to_string()),
            LogLevel::Info => {}
        }

        args
    }
}

/// Requested formats, with JSON always present since aggregation needs it.
pub fn report_formats(options: &AuditOptions) -> Vec<OutputFormat> {
    let mut formats = Vec::new();
    for format in &options.output {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }
    if !formats.contains(&OutputFormat::Json) {
        formats.push(OutputFormat::Json);
    }
    formats
}

/// Where Lighthouse writes a format for a given `--output-path`.
///
/// With several outputs each lands in `<base>.report.<ext>`; a single one
/// is written to the path as given.
pub fn report_path(output_base: &Path, format: OutputFormat, format_count: usize) -> PathBuf {
    if format_count > 1 {
        let mut name = output_base.as_os_str().to_owned();
        name.push(format!(".report.{}", format.extension()));
        PathBuf::from(name)
    } else {
        output_base.to_path_buf()
    }
}

#[async_trait]
impl AuditEngine for LighthouseCli {
    async fn run_audit(&self, url: &str, options: &AuditOptions) -> Result<RunnerResult> {
        let lighthouse_error = |message: String| LightavgError::Lighthouse {
            url: url.to_string(),
            message,
        };

        let workdir = tempfile::Builder::new().prefix("lightavg-").tempdir()?;
        let output_base = workdir.path().join("report");
        let args = self.build_args(url, options, &output_base);
        debug!("{} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| lighthouse_error(format!("failed to start {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(lighthouse_error(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let formats = report_formats(options);
        let mut reports = Vec::with_capacity(formats.len());
        for format in &formats {
            let path = report_path(&output_base, *format, formats.len());
            let body = fs::read_to_string(&path).await.map_err(|e| {
                lighthouse_error(format!("no {} report at {}: {}", format.extension(), path.display(), e))
            })?;
            reports.push((*format, body));
        }

        let json = reports
            .iter()
            .find(|(format, _)| *format == OutputFormat::Json)
            .map(|(_, body)| body.as_str())
            .unwrap_or_default();
        let lhr: AuditResult = serde_json::from_str(json)
            .map_err(|e| lighthouse_error(format!("unreadable JSON report: {}", e)))?;

        Ok(RunnerResult { lhr, reports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormFactor;

    fn cli() -> LighthouseCli {
        LighthouseCli::new(&LighthouseConfig::default())
    }

    #[test]
    fn test_build_args_defaults() {
        let options = AuditOptions::default().with_port(9222);
        let args = cli().build_args("https://a.test/", &options, Path::new("/tmp/x/report"));

        assert_eq!(args[0], "https://a.test/");
        for expected in [
            "--form-factor=desktop",
            "--screenEmulation.mobile=false",
            "--screenEmulation.width=1440",
            "--screenEmulation.height=900",
            "--screenEmulation.deviceScaleFactor=1",
            "--screenEmulation.disabled=false",
            "--port=9222",
            "--only-categories=performance,accessibility,best-practices,seo",
            "--output=html",
            "--output=json",
            "--output-path=/tmp/x/report",
            "--max-wait-for-load=120000",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected}");
        }
        assert!(!args.iter().any(|a| a == "--quiet" || a == "--verbose"));
    }

    #[test]
    fn test_build_args_overrides() {
        let mut options = AuditOptions::default();
        options.form_factor = FormFactor::Mobile;
        options.log_level = LogLevel::Silent;
        options.only_categories.clear();

        let args = cli().build_args("https://a.test/", &options, Path::new("report"));
        assert!(args.iter().any(|a| a == "--form-factor=mobile"));
        assert!(args.iter().any(|a| a == "--quiet"));
        assert!(!args.iter().any(|a| a.starts_with("--port")));
        assert!(!args.iter().any(|a| a.starts_with("--only-categories")));
    }

    #[test]
    fn test_json_is_always_requested() {
        let mut options = AuditOptions::default();
        options.output = vec![OutputFormat::Html, OutputFormat::Html];
        assert_eq!(
            report_formats(&options),
            vec![OutputFormat::Html, OutputFormat::Json]
        );
    }

    #[test]
    fn test_report_path() {
        let base = Path::new("/tmp/x/report");
        assert_eq!(
            report_path(base, OutputFormat::Html, 2),
            PathBuf::from("/tmp/x/report.report.html")
        );
        assert_eq!(report_path(base, OutputFormat::Json, 1), base.to_path_buf());
    }

    #[tokio::test]
    async fn test_missing_binary_is_audit_failure() {
        let engine = LighthouseCli::new(&LighthouseConfig {
            path: PathBuf::from("/nonexistent/lighthouse"),
            ..Default::default()
        });

        let err = engine
            .run_audit("https://a.test/", &AuditOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LightavgError::Lighthouse { ref url, .. } if url == "https://a.test/"));
    }
}
