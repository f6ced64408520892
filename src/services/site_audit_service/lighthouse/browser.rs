use crate::config::ChromeConfig;
use crate::error::{LightavgError, Result};
use async_trait::async_trait;
use log::{debug, info};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};

/// A browser the audit engine attaches to over its debugging port.
#[async_trait]
pub trait BrowserSession: Send {
    fn port(&self) -> u16;

    /// Releases the browser. Consumes the session so it happens once.
    async fn close(self) -> Result<()>;
}

/// Headless Chrome with a throwaway profile.
///
/// The process is also killed if the session is dropped without `close`.
#[derive(Debug)]
pub struct ChromeSession {
    child: Child,
    port: u16,
    _profile: TempDir,
}

impl ChromeSession {
    pub async fn launch(config: &ChromeConfig) -> Result<Self> {
        let port = match config.port {
            0 => free_port()?,
            port => port,
        };
        let profile = tempfile::Builder::new().prefix("lightavg-chrome-").tempdir()?;

        let child = Command::new(&config.path)
            .args(&config.flags)
            .arg(format!("--remote-debugging-port={}", port))
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .args(["--no-first-run", "--no-default-browser-check", "about:blank"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LightavgError::BrowserLaunch(format!("{}: {}", config.path.display(), e)))?;

        let mut session = Self {
            child,
            port,
            _profile: profile,
        };
        session
            .wait_until_ready(Duration::from_millis(config.startup_timeout_ms))
            .await?;

        info!("Chrome listening on debugging port {}", port);
        Ok(session)
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(LightavgError::BrowserLaunch(format!(
                    "exited before accepting connections ({})",
                    status
                )));
            }
            if TcpStream::connect(("127.0.0.1", self.port)).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(LightavgError::BrowserLaunch(format!(
                    "debugging port {} not ready after {:?}",
                    self.port, timeout
                )));
            }
            sleep(Duration::from_millis(100)).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn port(&self) -> u16 {
        self.port
    }

    async fn close(mut self) -> Result<()> {
        debug!("Killing Chrome on port {}", self.port);
        self.child
            .kill()
            .await
            .map_err(|e| LightavgError::BrowserClose(e.to_string()))
    }
}

fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}
