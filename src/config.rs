//! Server configuration

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Cli;

/// Everything the HTTP layer needs to start, built once in `main`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Fitted TF-IDF vectorizer artifact
    pub vectorizer_path: PathBuf,

    /// Fitted naive Bayes artifact
    pub classifier_path: PathBuf,

    /// Upper bound on a single inference call
    pub request_timeout_ms: u64,

    pub max_message_chars: usize,

    /// Worker threads; actix picks one per core when unset
    pub workers: Option<usize>,

    pub shutdown_timeout_secs: u64,

    /// Origins allowed to read `/health` cross-site. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            vectorizer_path: PathBuf::from("models/tfidf_vec.json"),
            classifier_path: PathBuf::from("models/nb_model.json"),
            request_timeout_ms: 2000,
            max_message_chars: 10_000,
            workers: None,
            shutdown_timeout_secs: 10,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(path) = &cli.vectorizer {
            config.vectorizer_path = path.clone();
        }
        if let Some(path) = &cli.classifier {
            config.classifier_path = path.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be positive");
        }
        if self.max_message_chars == 0 {
            bail!("max_message_chars must be positive");
        }
        if self.workers == Some(0) {
            bail!("workers must be positive when set");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
