//! Server settings.

use serde::Deserialize;
use std::path::PathBuf;

/// Server settings, read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin of the web client, the only origin allowed by CORS.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Base URL under which this server is reachable; derived from the port when unset.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Root directory for uploaded files.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// `ffprobe` executable used for duration probing.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// Largest accepted video upload request, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

const fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024 * 1024
}

impl Settings {
    /// Load settings from environment variables (`HOST`, `PORT`, `FRONTEND_URL`,
    /// `PUBLIC_URL`, `UPLOAD_DIR`, `FFPROBE_PATH`, `MAX_UPLOAD_BYTES`).
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.try_parsing(true).ignore_empty(true))
            .build()?
            .try_deserialize()
    }

    /// Base URL used for links to uploaded files
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Address to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
