//! Gateway configuration.
//!
//! Loaded from `config.toml` in the working directory (spec section 6,
//! "Environment"). Recognised keys are deliberately few and flat, matching
//! `original_source/src/config.py`'s bare `tomli.load` — there is no nested
//! schema to validate beyond what serde already enforces.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, merged from `config.toml` and CLI overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(rename = "HTTP_PROXY")]
    pub http_proxy: Option<String>,
    /// Directory holding the persistent caches (spec section 6: `cache/`).
    pub cache_dir: PathBuf,
    /// Rewrite outbound requests to a cached resolved IP with an explicit
    /// `Host` header (spec section 9, "DNS-cache rewriting" — an
    /// adversarial-network workaround, kept behind this flag).
    pub dns_cache_rewrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            http_proxy: None,
            cache_dir: PathBuf::from("cache"),
            dns_cache_rewrite: false,
        }
    }
}

impl Config {
    /// Load `config.toml` from `dir` if it exists; otherwise fall back to
    /// defaults, mirroring the original's `if os.path.exists("config.toml")`
    /// guard rather than erroring on a missing file.
    pub fn load(dir: &Path) -> anyhow::Result<Config> {
        let path = dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config.toml found, using defaults");
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn grid_dir(&self) -> PathBuf {
        self.cache_dir.join("grid")
    }

    pub fn post_cache_path(&self) -> PathBuf {
        self.cache_dir.join("post_data.sqlite")
    }

    pub fn shareid_cache_path(&self) -> PathBuf {
        self.cache_dir.join("shareid_data.sqlite")
    }
}

/// Command-line overrides, layered on top of `config.toml` (ambient: the
/// teacher's binaries are driven by env/CLI, not config-file-only).
#[derive(Debug, clap::Parser)]
#[command(name = "embedfix-gateway", about = "Embed-fixing gateway server")]
pub struct Cli {
    /// Directory to look for config.toml and to store cache/ in.
    #[arg(long, env = "EMBEDFIX_WORKDIR", default_value = ".")]
    pub workdir: PathBuf,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "EMBEDFIX_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Merge CLI/env overrides onto a file-loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}
