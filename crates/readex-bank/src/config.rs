//! readex configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default config file name searched in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "readex.toml";

/// Top-level readex configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadexConfig {
    /// Primary passage bank (JSON `{ "passages": [...] }`).
    #[serde(default = "default_passages_path")]
    pub passages_path: PathBuf,
    /// Supplementary question bank, matched by canonical passage id.
    #[serde(default = "default_supplementary_path")]
    pub supplementary_path: PathBuf,
    /// Optional flat answer-key file consulted when a question record has no
    /// resolvable correct answer.
    #[serde(default)]
    pub answer_keys_path: Option<PathBuf>,
    /// Default allotted minutes for a new attempt.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
}

fn default_passages_path() -> PathBuf {
    PathBuf::from("data/passages.json")
}
fn default_supplementary_path() -> PathBuf {
    PathBuf::from("data/passages_q9.json")
}
fn default_minutes() -> u32 {
    20
}

impl Default for ReadexConfig {
    fn default() -> Self {
        Self {
            passages_path: default_passages_path(),
            supplementary_path: default_supplementary_path(),
            answer_keys_path: None,
            default_minutes: default_minutes(),
        }
    }
}

/// Load configuration from an explicit path, or fall back to `readex.toml`
/// in the current directory, or defaults when neither exists.
pub fn load_config(path: Option<&Path>) -> Result<ReadexConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            Some(p.to_path_buf())
        }
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    match config_path {
        Some(p) => {
            let content = std::fs::read_to_string(&p)
                .with_context(|| format!("failed to read config: {}", p.display()))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", p.display()))?;
            Ok(config)
        }
        None => Ok(ReadexConfig::default()),
    }
}
