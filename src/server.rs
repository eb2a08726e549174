use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::commands::{self, CommandResult};
use crate::context::Context;
use crate::sender::MessageSender;
use crate::webhook::{self, WebhookError, WebhookOutcome};

pub const HEALTH_ENDPOINT: &str = "/health";
pub const GITHUB_WEBHOOK_ENDPOINT: &str = "/github/{space_id}";
pub const COMMAND_ENDPOINT: &str = "/commands/{space_id}";

pub struct AppState {
    pub context: Mutex<Context>,
    pub sender: Box<dyn MessageSender>,
}

impl AppState {
    pub fn new(context: Context, sender: Box<dyn MessageSender>) -> Self {
        Self {
            context: Mutex::new(context),
            sender,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub content: Vec<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_ENDPOINT, get(handle_health))
        .route(GITHUB_WEBHOOK_ENDPOINT, post(handle_github_webhook))
        .route(COMMAND_ENDPOINT, post(handle_command))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound address")?;
    info!("github bridge listening on {}", local_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("github bridge server exited unexpectedly")
}

async fn handle_health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

async fn handle_github_webhook(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let outcome = webhook::handle_github_webhook(state.sender.as_ref(), &space_id, &body).await?;

    let status = match outcome {
        WebhookOutcome::Delivered(_) => "delivered",
        WebhookOutcome::Ignored(_) => "ignored",
    };

    Ok((StatusCode::OK, Json(json!({ "status": status }))).into_response())
}

async fn handle_command(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResult> {
    let result = {
        let mut ctx = state.context.lock().await;
        commands::call_github_api(&mut ctx, &space_id, &request.content).await
    };

    if let Err(e) = state
        .sender
        .send_with_title(&space_id, &result.title, &result.message)
        .await
    {
        warn!("Could not post command result to space {}: {:#}", space_id, e);
    }

    Json(result)
}
