//! Liveness probing for the bot process behind the wiring.
//!
//! Two strategies behind one trait: an HTTP probe against the worker's
//! health route, and a process-table scan. The scan is a best-effort
//! heuristic: it reads the local process table, so it reports false
//! negatives on containerized or service-managed deployments and must
//! never be treated as authoritative.

use crate::http;
use async_trait::async_trait;
use tokio::process::Command;

/// Entrypoints the deployed bot is known to run under, used when the
/// operator sets no `BOT_PROCESS` patterns.
pub const DEFAULT_PROCESS_PATTERNS: &[&str] = &["bot.py", "telegram_bot.py", "main.py", "app.py"];

const PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct LivenessReport {
    pub alive: bool,
    pub detail: String,
}

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> LivenessReport;
}

/// GET against the worker's `/health` route.
pub struct HealthUrlProbe {
    url: String,
    client: reqwest::Client,
}

impl HealthUrlProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: http::client(PROBE_TIMEOUT_SECS),
        }
    }

    /// Derive the probe URL from a worker base URL.
    pub fn for_worker(worker_url: &str) -> Self {
        Self::new(format!("{}/health", worker_url.trim_end_matches('/')))
    }
}

#[async_trait]
impl LivenessProbe for HealthUrlProbe {
    fn name(&self) -> &str {
        "health probe"
    }

    async fn check(&self) -> LivenessReport {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => LivenessReport {
                alive: true,
                detail: format!("{} answered {}", self.url, response.status().as_u16()),
            },
            Ok(response) => LivenessReport {
                alive: false,
                detail: format!("{} answered {}", self.url, response.status().as_u16()),
            },
            Err(e) => LivenessReport {
                alive: false,
                detail: format!("{} unreachable: {e}", self.url),
            },
        }
    }
}

/// Scan the local process table for known bot entrypoints via `pgrep`,
/// falling back to `ps aux` when `pgrep` is unavailable.
pub struct ProcessScanProbe {
    patterns: Vec<String>,
}

impl ProcessScanProbe {
    pub fn new(patterns: &[String]) -> Self {
        let patterns = if patterns.is_empty() {
            DEFAULT_PROCESS_PATTERNS
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            patterns.to_vec()
        };
        Self { patterns }
    }

    async fn pgrep(pattern: &str) -> Option<String> {
        let output = Command::new("pgrep")
            .arg("-f")
            .arg(pattern)
            .output()
            .await
            .ok()?;
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    async fn ps_fallback(&self) -> bool {
        let Ok(output) = Command::new("ps").arg("aux").output().await else {
            return false;
        };
        let table = String::from_utf8_lossy(&output.stdout).to_lowercase();
        self.patterns
            .iter()
            .any(|p| table.contains(&p.to_lowercase()))
    }
}

#[async_trait]
impl LivenessProbe for ProcessScanProbe {
    fn name(&self) -> &str {
        "process scan"
    }

    async fn check(&self) -> LivenessReport {
        for pattern in &self.patterns {
            if let Some(pids) = Self::pgrep(pattern).await {
                return LivenessReport {
                    alive: true,
                    detail: format!("{pattern} running (pid {pids})"),
                };
            }
        }

        if self.ps_fallback().await {
            return LivenessReport {
                alive: true,
                detail: "a matching process appears in the process table".to_string(),
            };
        }

        LivenessReport {
            alive: false,
            detail: format!("no process matching {:?}", self.patterns),
        }
    }
}
