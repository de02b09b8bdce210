//! Default locations for the profile database and policy config.
//!
//! Both live under `$HOME/.kaamyab/`. The CLI's `--db` and `--config` flags
//! (or `KAAMYAB_DB` / `KAAMYAB_CONFIG`) take precedence over these.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

fn kaamyab_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".kaamyab"))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(kaamyab_dir()?.join("access.db"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(kaamyab_dir()?.join("access.toml"))
}

pub fn resolve_db_path(cli_db: Option<String>) -> Result<String> {
    match cli_db {
        Some(p) => Ok(p),
        None => {
            let path = default_db_path()?;
            Ok(path
                .to_str()
                .context("default DB path is not valid UTF-8")?
                .to_string())
        }
    }
}

pub fn resolve_config_path(cli_config: Option<String>) -> Result<PathBuf> {
    match cli_config {
        Some(p) => Ok(PathBuf::from(p)),
        None => default_config_path(),
    }
}

pub fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
