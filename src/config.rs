use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// How the adapter treats tier names other than `standard` and `pro`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTierPolicy {
    #[default]
    Paid,
    Standard,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub unknown_tier: UnknownTierPolicy,
    /// Added on top of the built-in disposable provider list.
    #[serde(default)]
    pub disposable_domains: Vec<String>,
    #[serde(default)]
    pub enterprise_domains: Vec<String>,
}

impl Config {
    /// Load config from `path`.
    /// Returns default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let lists = [
            ("disposable_domains", &self.policy.disposable_domains),
            ("enterprise_domains", &self.policy.enterprise_domains),
        ];
        for (key, domains) in lists {
            for domain in domains {
                if domain.trim().is_empty()
                    || domain.contains('@')
                    || domain.chars().any(char::is_whitespace)
                {
                    bail!(
                        "failed to parse {}: policy.{key} entry '{domain}' is not a bare domain",
                        path.display()
                    );
                }
            }
        }
        Ok(())
    }
}
