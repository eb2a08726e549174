use log::{debug, info, warn};
use serde::Serialize;

use crate::context::Context;
use crate::github;

pub const FAILED: &str = "Failed";
pub const SUCCEEDED: &str = "Succeeded";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Set,
    Context,
    List,
    Create,
}

/// Argument counts an operation accepts and whether it needs a repository.
#[derive(Clone, Copy, Debug)]
pub struct OperationSpec {
    pub arities: &'static [usize],
    pub needs_context: bool,
}

impl Operation {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "set" => Some(Self::Set),
            "context" => Some(Self::Context),
            "list" => Some(Self::List),
            "create" => Some(Self::Create),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Context => "context",
            Self::List => "list",
            Self::Create => "create",
        }
    }

    pub fn spec(&self) -> OperationSpec {
        match self {
            Self::Set => OperationSpec {
                arities: &[2],
                needs_context: false,
            },
            Self::Context => OperationSpec {
                arities: &[0],
                needs_context: true,
            },
            Self::List => OperationSpec {
                arities: &[1],
                needs_context: true,
            },
            Self::Create => OperationSpec {
                arities: &[2],
                needs_context: true,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub title: String,
    pub message: String,
}

impl CommandResult {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(FAILED, message)
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self::new(SUCCEEDED, message)
    }

    pub fn is_failure(&self) -> bool {
        self.title == FAILED
    }
}

/// Validates and runs one chat command. Failures come back as a `Failed`
/// result, never as an error.
pub async fn call_github_api(ctx: &mut Context, space_id: &str, content: &[String]) -> CommandResult {
    let Some((op_name, args)) = content.split_first() else {
        return CommandResult::failed("Please provide an operation");
    };

    let Some(op) = Operation::parse(op_name) else {
        return CommandResult::failed(format!("Operation [{}] is not supported", op_name));
    };

    let spec = op.spec();
    if !spec.arities.contains(&args.len()) {
        let arities = spec
            .arities
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<String>>()
            .join("|");
        return CommandResult::failed(format!(
            "Operation {} requires {} more additional arguments",
            op.name(),
            arities
        ));
    }

    if spec.needs_context && !ctx.is_set() {
        return CommandResult::failed("Context is not set yet");
    }

    debug!("Running {} for space {} with {:?}", op.name(), space_id, args);

    match op {
        Operation::Set => set(ctx, &args[0], &args[1]),
        Operation::Context => context(ctx),
        Operation::List => list(ctx, &args[0]).await,
        Operation::Create => create(ctx, &args[0], &args[1]).await,
    }
}

fn set(ctx: &mut Context, owner: &str, repo: &str) -> CommandResult {
    ctx.set(owner, repo);
    info!("Github context set to {}/{}", owner, repo);

    CommandResult::succeeded(format!(
        "Github context is set to [owner: {}] [repo: {}]",
        owner, repo
    ))
}

fn context(ctx: &Context) -> CommandResult {
    match ctx.target() {
        Some((owner, repo)) => CommandResult::succeeded(format!(
            "Current context is [owner: {}] [repo: {}]",
            owner, repo
        )),
        None => CommandResult::failed("Context is not set yet"),
    }
}

async fn list(ctx: &Context, milestone: &str) -> CommandResult {
    let Some((owner, repo)) = ctx.target() else {
        return CommandResult::failed("Context is not set yet");
    };

    let issues = match github::list_issues(ctx, owner, repo).await {
        Ok(issues) => issues,
        Err(e) => {
            warn!("Listing issues of {}/{} failed: {:#}", owner, repo, e);
            return CommandResult::failed("Bad request");
        }
    };

    let lines = issues
        .iter()
        .filter(|issue| issue.in_milestone(milestone))
        .map(|issue| format!("[#{} - {}]({})", issue.number, issue.title, issue.html_url))
        .collect::<Vec<String>>();

    if lines.is_empty() {
        return CommandResult::failed(format!(
            "No issue is tagged with milestone: {}",
            milestone
        ));
    }

    CommandResult::succeeded(lines.join("\n"))
}

async fn create(ctx: &Context, title: &str, milestone: &str) -> CommandResult {
    let Some((owner, repo)) = ctx.target() else {
        return CommandResult::failed("Context is not set yet");
    };

    let milestone_number = match github::list_milestones(ctx, owner, repo).await {
        Ok(milestones) => {
            github::find_or_create_milestone(ctx, owner, repo, &milestones, milestone).await
        }
        Err(e) => Err(e),
    };

    let milestone_number = match milestone_number {
        Ok(number) => number,
        Err(e) => {
            warn!("Resolving milestone {} failed: {}", milestone, e);
            return CommandResult::failed(format!("Cannot create milestone: {}", milestone));
        }
    };

    match github::create_issue(ctx, owner, repo, title, milestone_number).await {
        Ok(issue) => {
            info!("Created issue #{} in {}/{}", issue.number, owner, repo);
            CommandResult::new(
                "Issue created",
                format!("[#{} {}]({})", issue.number, issue.title, issue.html_url),
            )
        }
        Err(e) => {
            warn!("Creating issue {} failed: {:#}", title, e);
            CommandResult::failed(format!("Cannot create issue: {}", title))
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{CommandResult, Operation, call_github_api};
    use crate::context::Context;

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn operation_table() {
        for name in ["set", "context", "list", "create"] {
            let op = Operation::parse(name).expect("known operation");
            assert_eq!(op.name(), name);
        }

        assert_eq!(Operation::Set.spec().arities, &[2]);
        assert!(!Operation::Set.spec().needs_context);
        assert_eq!(Operation::Context.spec().arities, &[0]);
        assert_eq!(Operation::List.spec().arities, &[1]);
        assert!(Operation::Create.spec().needs_context);
        assert!(Operation::parse("delete").is_none());
    }

    #[tokio::test]
    async fn empty_command() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        let result = call_github_api(&mut ctx, "space", &[]).await;

        assert_eq!(result, CommandResult::failed("Please provide an operation"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_operation() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        let result = call_github_api(&mut ctx, "space", &tokens(&["delete", "x"])).await;

        assert_eq!(
            result,
            CommandResult::failed("Operation [delete] is not supported")
        );
        Ok(())
    }

    #[tokio::test]
    async fn wrong_arity() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        let result = call_github_api(&mut ctx, "space", &tokens(&["set", "octo"])).await;

        assert_eq!(
            result,
            CommandResult::failed("Operation set requires 2 more additional arguments")
        );
        Ok(())
    }

    #[tokio::test]
    async fn arity_is_checked_before_context() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        let result = call_github_api(&mut ctx, "space", &tokens(&["list"])).await;

        assert_eq!(
            result,
            CommandResult::failed("Operation list requires 1 more additional arguments")
        );
        Ok(())
    }

    #[tokio::test]
    async fn context_required() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        for command in [
            tokens(&["context"]),
            tokens(&["list", "v1"]),
            tokens(&["create", "Bug", "v1"]),
        ] {
            let result = call_github_api(&mut ctx, "space", &command).await;
            assert_eq!(result, CommandResult::failed("Context is not set yet"));
        }

        Ok(())
    }

    #[tokio::test]
    async fn set_then_context() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        let set = call_github_api(&mut ctx, "space", &tokens(&["set", "octo", "widgets"])).await;
        assert_eq!(
            set,
            CommandResult::succeeded("Github context is set to [owner: octo] [repo: widgets]")
        );

        let first = call_github_api(&mut ctx, "space", &tokens(&["context"])).await;
        let second = call_github_api(&mut ctx, "space", &tokens(&["context"])).await;

        assert_eq!(
            first,
            CommandResult::succeeded("Current context is [owner: octo] [repo: widgets]")
        );
        assert_eq!(first, second);
        assert!(!first.is_failure());

        Ok(())
    }

    #[tokio::test]
    async fn set_overwrites_previous_context() -> Result<()> {
        let mut ctx = Context::new("http://localhost", "")?;

        call_github_api(&mut ctx, "space", &tokens(&["set", "octo", "widgets"])).await;
        call_github_api(&mut ctx, "space", &tokens(&["set", "acme", "gears"])).await;

        assert_eq!(ctx.target(), Some(("acme", "gears")));
        Ok(())
    }
}
