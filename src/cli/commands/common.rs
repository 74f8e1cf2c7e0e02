//! Helpers shared by the commands

use anyhow::{Result, anyhow};
use camino::Utf8PathBuf;
use quorum_config::Config;

/// The configured output directory as a UTF-8 path
pub fn output_root(config: &Config) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(config.defaults.output_dir.clone()).map_err(|path| {
        anyhow!(
            "Output directory is not valid UTF-8: {}",
            path.display()
        )
    })
}

/// `12.3456` → `$12.35`
pub fn usd(amount: f64) -> String {
    format!("${amount:.2}")
}
