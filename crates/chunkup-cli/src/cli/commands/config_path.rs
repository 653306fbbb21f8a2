//! `chunkup config-path` – print where the config file lives.

use anyhow::Result;
use chunkup_core::config;

pub fn run_config_path() -> Result<()> {
    println!("{}", config::config_path()?.display());
    Ok(())
}
