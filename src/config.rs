use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub github_api_url: String,
    pub github_access_token: String,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub workspace_api_url: Option<String>,
    pub workspace_token: Option<String>,
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_api_url: DEFAULT_API_URL.to_string(),
            github_access_token: String::new(),
            github_owner: None,
            github_repo: None,
            workspace_api_url: None,
            workspace_token: None,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            github_api_url: var("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_access_token: var("GITHUB_ACCESS_TOKEN").unwrap_or_default(),
            github_owner: var("GITHUB_OWNER"),
            github_repo: var("GITHUB_REPO"),
            workspace_api_url: var("WORKSPACE_API_URL"),
            workspace_token: var("WORKSPACE_TOKEN"),
            bind: var("BRIDGE_BIND").unwrap_or(defaults.bind),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
