use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use serde_json::json;

use crate::config::Config;

pub const DEFAULT_COLOR: &str = "#1192fc";
pub const ACTOR_NAME: &str = "GitHub";

/// Delivers formatted messages to a chat space.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn build_and_send(
        &self,
        space_id: &str,
        message: &str,
        title: &str,
        color: &str,
    ) -> Result<()>;

    async fn send_with_title(&self, space_id: &str, title: &str, message: &str) -> Result<()> {
        self.build_and_send(space_id, message, title, DEFAULT_COLOR)
            .await
    }
}

/// Posts app messages to the workspace REST API.
pub struct WorkspaceSender {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl WorkspaceSender {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn messages_url(&self, space_id: &str) -> String {
        format!("{}/v1/spaces/{}/messages", self.api_url, space_id)
    }
}

#[async_trait]
impl MessageSender for WorkspaceSender {
    async fn build_and_send(
        &self,
        space_id: &str,
        message: &str,
        title: &str,
        color: &str,
    ) -> Result<()> {
        let body = json!({
            "type": "appMessage",
            "version": 1.0,
            "annotations": [{
                "type": "generic",
                "version": 1.0,
                "color": color,
                "title": title,
                "text": message,
                "actor": { "name": ACTOR_NAME },
            }],
        });

        self.client
            .post(self.messages_url(space_id))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach workspace for space {}", space_id))?
            .error_for_status()
            .with_context(|| format!("Workspace rejected message for space {}", space_id))?;

        info!("Sent \"{}\" to space {}", title, space_id);
        Ok(())
    }
}

/// Logs messages instead of delivering them.
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    async fn build_and_send(
        &self,
        space_id: &str,
        message: &str,
        title: &str,
        color: &str,
    ) -> Result<()> {
        info!("[{}] {} ({}): {}", space_id, title, color, message.trim_end());
        Ok(())
    }
}

/// Picks the workspace sender when a workspace URL is configured.
pub fn from_config(config: &Config) -> Box<dyn MessageSender> {
    match &config.workspace_api_url {
        Some(url) => Box::new(WorkspaceSender::new(
            url,
            config.workspace_token.as_deref().unwrap_or_default(),
        )),
        None => {
            info!("No workspace API configured, messages will only be logged");
            Box::new(LogSender)
        }
    }
}
