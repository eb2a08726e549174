use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::sender::MessageSender;

pub const OPENED_COLOR: &str = "#3d8b38";
pub const CLOSED_COLOR: &str = "#cc0000";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Could not process github webhook: {0}")]
    InvalidRequest(String),
    #[error("Malformed github webhook payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("Could not deliver message to space {space_id}")]
    Delivery {
        space_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MalformedPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Delivery { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match &self {
            Self::Delivery { source, .. } => warn!("{}: {:#}", self, source),
            _ => warn!("{}", self),
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueEvent {
    pub action: String,
    pub repository: Repository,
    pub issue: IssueRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub title: String,
    pub text: String,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Delivered(ChatMessage),
    Ignored(String),
}

/// Builds the chat message for an issue event, or `None` for actions the
/// bridge does not announce.
pub fn build_github_message(event: &IssueEvent) -> Option<ChatMessage> {
    let color = match event.action.as_str() {
        "opened" => OPENED_COLOR,
        "closed" => CLOSED_COLOR,
        _ => return None,
    };

    Some(ChatMessage {
        title: format!(
            "{} - Issue {}",
            event.repository.full_name, event.action
        ),
        text: format!(
            "[#{} - {}]({})\n",
            event.issue.number, event.issue.title, event.issue.html_url
        ),
        color,
    })
}

pub fn parse_payload(body: &[u8]) -> Result<IssueEvent, WebhookError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(WebhookError::InvalidRequest("empty body".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| WebhookError::InvalidRequest(format!("body is not JSON ({})", e)))?;
    if value.is_null() {
        return Err(WebhookError::InvalidRequest("null body".to_string()));
    }

    serde_json::from_value(value).map_err(WebhookError::MalformedPayload)
}

pub async fn handle_github_webhook(
    sender: &dyn MessageSender,
    space_id: &str,
    body: &[u8],
) -> Result<WebhookOutcome, WebhookError> {
    info!("Processing webhook from github for space {}", space_id);

    let event = parse_payload(body)?;

    let Some(message) = build_github_message(&event) else {
        info!(
            "Unsupported request: action {} on {}#{}",
            event.action, event.repository.full_name, event.issue.number
        );
        return Ok(WebhookOutcome::Ignored(event.action));
    };

    sender
        .build_and_send(space_id, &message.text, &message.title, message.color)
        .await
        .map_err(|source| WebhookError::Delivery {
            space_id: space_id.to_string(),
            source,
        })?;

    Ok(WebhookOutcome::Delivered(message))
}
