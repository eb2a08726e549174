use anyhow::{Result, bail};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::Context;

#[derive(Clone, Debug, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub milestone: Option<Milestone>,
}

impl Issue {
    pub fn in_milestone(&self, title: &str) -> bool {
        self.milestone.as_ref().is_some_and(|m| m.title == title)
    }
}

#[derive(Debug, Serialize)]
struct NewMilestone<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    milestone: u64,
}

/// Decodes a raw response body, failing unless GitHub answered `expected`.
fn decode_expected<R: DeserializeOwned>(
    status: StatusCode,
    expected: StatusCode,
    body: &str,
) -> Result<R> {
    if status != expected {
        bail!("GitHub answered {} (expected {}): {}", status, expected, body);
    }

    Ok(serde_json::from_str(body)?)
}

/// Open issues of the repository. Only a 200 answer counts.
pub async fn list_issues(ctx: &Context, owner: &str, repo: &str) -> Result<Vec<Issue>> {
    let url = format!("{}?state=open", ctx.repo_url(owner, repo, "issues"));
    let response = ctx.octocrab._get(url).await?;
    let status = response.status();
    let body = ctx.octocrab.body_to_string(response).await?;

    decode_expected(status, StatusCode::OK, &body)
}

/// Milestones of the repository, open and closed.
pub async fn list_milestones(
    ctx: &Context,
    owner: &str,
    repo: &str,
) -> Result<Vec<Milestone>, octocrab::Error> {
    ctx.octocrab
        .get(ctx.repo_url(owner, repo, "milestones"), Some(&[("state", "all")]))
        .await
}

pub async fn create_milestone(
    ctx: &Context,
    owner: &str,
    repo: &str,
    title: &str,
) -> Result<Milestone, octocrab::Error> {
    ctx.octocrab
        .post(
            ctx.repo_url(owner, repo, "milestones"),
            Some(&NewMilestone { title }),
        )
        .await
}

/// Creates an issue attached to `milestone`. Only a 201 answer counts.
pub async fn create_issue(
    ctx: &Context,
    owner: &str,
    repo: &str,
    title: &str,
    milestone: u64,
) -> Result<Issue> {
    let response = ctx
        .octocrab
        ._post(
            ctx.repo_url(owner, repo, "issues"),
            Some(&NewIssue { title, milestone }),
        )
        .await?;
    let status = response.status();
    let body = ctx.octocrab.body_to_string(response).await?;

    decode_expected(status, StatusCode::CREATED, &body)
}

/// Returns the number of the milestone titled `title`, creating it when
/// `milestones` has none.
pub async fn find_or_create_milestone(
    ctx: &Context,
    owner: &str,
    repo: &str,
    milestones: &[Milestone],
    title: &str,
) -> Result<u64, octocrab::Error> {
    if let Some(existing) = milestones.iter().find(|m| m.title == title) {
        return Ok(existing.number);
    }

    let created = create_milestone(ctx, owner, repo, title).await?;
    Ok(created.number)
}
