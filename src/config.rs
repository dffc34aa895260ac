//! Settings file, `~/.doopla` by default:
//!
//! ```toml
//! [main]
//! webui_url = "https://historyserver.example.com:19888"
//! hadoop_user = "alice"
//! http_user = "alice"
//! http_password = "secret"
//! hadoop_version = 2
//! ```

use crate::types::{string_or_number, ClusterEndpoint, Credentials, Generation};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".doopla";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub main: MainSection,
}

#[derive(Deserialize)]
pub struct MainSection {
    pub webui_url: String,
    pub hadoop_user: String,
    pub http_user: String,
    pub http_password: String,
    #[serde(default = "default_hadoop_version", deserialize_with = "string_or_number")]
    pub hadoop_version: String,
    /// Skip TLS certificate validation (self-signed cluster certificates)
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for MainSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainSection")
            .field("webui_url", &self.webui_url)
            .field("hadoop_user", &self.hadoop_user)
            .field("http_user", &self.http_user)
            .field("hadoop_version", &self.hadoop_version)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_hadoop_version() -> String {
    "2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// `DOOPLA_CONFIG` if set, otherwise `~/.doopla`
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = env::var("DOOPLA_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = env::var("HOME").context("HOME is not set; pass --config")?;
        Ok(Path::new(&home).join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
        let mut settings = Self::parse(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        if let Ok(password) = env::var("DOOPLA_HTTP_PASSWORD") {
            settings.main.http_password = password;
        }

        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings")
    }

    pub fn generation(&self) -> Generation {
        Generation::from_setting(&self.main.hadoop_version)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.main.http_user, &self.main.http_password)
    }

    pub fn endpoint(&self) -> Result<ClusterEndpoint> {
        ClusterEndpoint::new(&self.main.webui_url, &self.main.hadoop_user)
            .context("Invalid webui_url in settings")
    }
}
