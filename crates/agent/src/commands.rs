use std::path::Path;

use anyhow::{Context, Result};
use infrastructure::config::AgentConfig;

/// `check-config`: load and validate, then print the effective config
/// with URL credentials masked.
pub fn cmd_check_config(path: &str) -> Result<()> {
    print!("{}", render_checked_config(path)?);
    Ok(())
}

fn render_checked_config(path: &str) -> Result<String> {
    let config = AgentConfig::load(Path::new(path))
        .with_context(|| format!("invalid configuration in {path}"))?;
    let yaml = serde_yaml_ng::to_string(&config.sanitized())
        .context("failed to render configuration")?;
    Ok(format!("# {path}: configuration is valid\n{yaml}"))
}
