use anyhow::{Context as _, Result, bail};
use axum::http::header::AUTHORIZATION;
use octocrab::Octocrab;
use reqwest::Url;

use crate::config::Config;

/// Repository the chat commands operate on, plus the client used to reach it.
/// The access token lives in the client's default `Authorization` header.
pub struct Context {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub api_url: Url,
    pub octocrab: Octocrab,
}

impl Context {
    pub fn new(api_url: &str, access_token: &str) -> Result<Self> {
        let api_url = Url::parse(api_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid GitHub API URL: {}", api_url))?;
        if api_url.cannot_be_a_base() {
            bail!("GitHub API URL cannot be used as a base: {}", api_url);
        }

        let mut builder = Octocrab::builder().base_uri(api_url.as_str())?;
        if !access_token.is_empty() {
            builder = builder.add_header(AUTHORIZATION, format!("token {}", access_token));
        }

        Ok(Self {
            owner: None,
            repo: None,
            api_url,
            octocrab: builder.build()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut ctx = Self::new(&config.github_api_url, &config.github_access_token)?;
        ctx.owner = config.github_owner.clone();
        ctx.repo = config.github_repo.clone();

        Ok(ctx)
    }

    pub fn set(&mut self, owner: &str, repo: &str) {
        self.owner = Some(owner.to_string());
        self.repo = Some(repo.to_string());
    }

    /// `(owner, repo)` once both are known.
    pub fn target(&self) -> Option<(&str, &str)> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Some((owner.as_str(), repo.as_str())),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.target().is_some()
    }

    /// `{api_url}/repos/{owner}/{repo}/{resource}` with each segment
    /// percent-encoded.
    pub fn repo_url(&self, owner: &str, repo: &str, resource: &str) -> String {
        let mut url = self.api_url.clone();
        // cannot-be-a-base URLs are rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", owner, repo, resource]);
        }

        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::Context;

    #[tokio::test]
    async fn context_starts_unset() -> Result<()> {
        let ctx = Context::new("https://api.github.com/", "token")?;

        assert!(!ctx.is_set());
        assert_eq!(ctx.api_url.as_str(), "https://api.github.com/");

        Ok(())
    }

    #[tokio::test]
    async fn set_populates_target() -> Result<()> {
        let mut ctx = Context::new("https://api.github.com", "token")?;
        ctx.set("octo", "widgets");

        assert_eq!(ctx.target(), Some(("octo", "widgets")));
        assert_eq!(
            ctx.repo_url("octo", "widgets", "issues"),
            "https://api.github.com/repos/octo/widgets/issues"
        );

        Ok(())
    }

    #[tokio::test]
    async fn repo_url_keeps_enterprise_prefix() -> Result<()> {
        let ctx = Context::new("https://ghe.example.com/api/v3/", "token")?;

        assert_eq!(
            ctx.repo_url("octo", "widgets", "milestones"),
            "https://ghe.example.com/api/v3/repos/octo/widgets/milestones"
        );

        Ok(())
    }

    #[tokio::test]
    async fn repo_url_escapes_segments() -> Result<()> {
        let ctx = Context::new("https://api.github.com", "token")?;

        assert_eq!(
            ctx.repo_url("oc to", "a/b", "issues"),
            "https://api.github.com/repos/oc%20to/a%2Fb/issues"
        );

        Ok(())
    }

    #[test]
    fn rejects_invalid_api_url() {
        assert!(Context::new("not a url", "token").is_err());
        assert!(Context::new("mailto:someone@example.com", "token").is_err());
    }

    #[tokio::test]
    async fn owner_alone_is_not_a_context() -> Result<()> {
        let mut ctx = Context::new("https://api.github.com", "")?;
        ctx.owner = Some("octo".to_string());

        assert!(!ctx.is_set());

        Ok(())
    }
}
