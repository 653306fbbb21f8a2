use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Retry policy parameters for part retransmission (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per part (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/chunkup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkupConfig {
    /// Service root; requests go to `<base_url>/Files(<id>)...`.
    pub base_url: String,
    /// Bearer credential sent with every request. Overridden by `CHUNKUP_TOKEN` in the CLI.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Part size in bytes used when splitting a file.
    pub chunk_size: u64,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, including the part body.
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, parts are sent once.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ChunkupConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            bearer_token: None,
            chunk_size: 4 * 1024 * 1024,
            connect_timeout_secs: 15,
            timeout_secs: 300,
            retry: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkupConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ChunkupConfig::default();
        assert_eq!(cfg.chunk_size, 4 * 1024 * 1024);
        assert_eq!(cfg.connect_timeout_secs, 15);
        assert_eq!(cfg.timeout_secs, 300);
        assert!(cfg.bearer_token.is_none());
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = ChunkupConfig::default();
        cfg.bearer_token = Some("secret".into());
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ChunkupConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_url, cfg.base_url);
        assert_eq!(parsed.bearer_token.as_deref(), Some("secret"));
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
    }

    #[test]
    fn config_toml_with_retry() {
        let toml = r#"
            base_url = "https://files.example.com/odata"
            chunk_size = 1_048_576
            connect_timeout_secs = 5
            timeout_secs = 60

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: ChunkupConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.base_url, "https://files.example.com/odata");
        assert_eq!(cfg.chunk_size, 1_048_576);
        assert!(cfg.bearer_token.is_none());
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }
}
