//! Playback duration probing through `ffprobe`

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::process::Command;
use tracing::{error, info};

/// Label reported when a file is missing or cannot be probed
pub const UNKNOWN_DURATION: &str = "0:00";

/// Probes running at once for a single listing
const MAX_CONCURRENT_PROBES: usize = 8;

/// Default limit for a single ffprobe run
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    ffprobe: PathBuf,
    timeout: Duration,
}

impl MetadataExtractor {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Override how long a single probe may run before it is killed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run ffprobe against `file_path` and return the container duration in seconds
    pub async fn extract_duration(&self, file_path: &Path) -> Result<f64> {
        info!("Extracting duration from file: {}", file_path.display());

        let probe = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(file_path)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, probe)
            .await
            .with_context(|| format!("ffprobe timed out after {:?}", self.timeout))?
            .with_context(|| format!("failed to spawn {}", self.ffprobe.display()))?;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "ffprobe failed with status: {:?}",
                output.status
            ));
        }

        let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        Self::parse_ffprobe_output(&ffprobe_data)
            .ok_or_else(|| anyhow::anyhow!("ffprobe output carries no format.duration"))
    }

    /// Human-readable duration for a stored file, `0:00` when unavailable
    pub async fn duration_label(&self, file_path: &Path) -> String {
        if !tokio::fs::try_exists(file_path).await.unwrap_or(false) {
            error!("File not found: {}", file_path.display());
            return UNKNOWN_DURATION.to_string();
        }

        match self.extract_duration(file_path).await {
            Ok(seconds) => format_duration(seconds),
            Err(e) => {
                error!(
                    "Error fetching duration for {}: {:#}",
                    file_path.display(),
                    e
                );
                UNKNOWN_DURATION.to_string()
            }
        }
    }

    /// Probe several files with bounded concurrency, preserving input order
    pub async fn duration_labels(&self, paths: &[PathBuf]) -> Vec<String> {
        let probes: Vec<_> = paths.iter().map(|path| self.duration_label(path)).collect();
        stream::iter(probes)
            .buffered(MAX_CONCURRENT_PROBES)
            .collect()
            .await
    }

    fn parse_ffprobe_output(ffprobe_data: &serde_json::Value) -> Option<f64> {
        let duration = ffprobe_data.get("format")?.get("duration")?;

        // ffprobe prints numbers as strings in its JSON writer
        let seconds = match duration {
            serde_json::Value::String(s) => s.parse::<f64>().ok()?,
            other => other.as_f64()?,
        };

        (seconds.is_finite() && seconds > 0.0).then_some(seconds)
    }
}

/// Render seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
