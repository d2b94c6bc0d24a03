use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use kubeglance_health::{DEFAULT_PROBLEM_CAP, HealthOptions, ResourceKind};

use crate::cli::SummaryArgs;

/// Optional settings read from the config file
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub problem_cap: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub include_releases: Option<bool>,
    pub default_namespace: Option<String>,
    pub critical_kinds: Option<Vec<ResourceKind>>,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kubeglance").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default location if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Combine file settings with command line flags, flags winning
    pub fn health_options(&self, args: &SummaryArgs) -> HealthOptions {
        let options = HealthOptions {
            problem_cap: args
                .problem_cap
                .or(self.problem_cap)
                .unwrap_or(DEFAULT_PROBLEM_CAP),
            timeout: args.timeout.or(self.timeout_secs).map(Duration::from_secs),
            include_releases: !args.no_releases && self.include_releases.unwrap_or(true),
            ..Default::default()
        };

        match &self.critical_kinds {
            Some(kinds) => options.with_critical_kinds(kinds),
            None => options,
        }
    }
}
