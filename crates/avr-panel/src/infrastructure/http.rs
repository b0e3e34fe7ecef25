//! HTTP surface: the button page and the JSON control endpoints.
//!
//! Routes:
//!
//! | Method | Path                  | Purpose                              |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/`                   | server-rendered button page          |
//! | POST   | `/api/connect`        | open the receiver connection         |
//! | POST   | `/api/disconnect`     | close the receiver connection        |
//! | GET    | `/api/status`         | connection flag + current state      |
//! | POST   | `/api/command/{name}` | run a named command from the table   |
//! | POST   | `/api/command`        | run a validated custom command       |
//! | GET    | `/ws/state`           | WebSocket push channel               |
//!
//! All endpoints answer 200 with a JSON body; failures are reported in the
//! body's `success`/`error` fields so the page's fetch handlers stay simple.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::warn;

use avr_core::{sanitize_command, validate_sequence, CommandTable};

use crate::application::controller::{AvrController, ControllerError};
use crate::domain::messages::{
    CommandResponse, ConnectionResponse, CustomCommandRequest, StatusResponse,
};
use crate::infrastructure::{page, ws};

/// Shared handler state: the controller and the command table.
#[derive(Clone)]
pub struct AppState {
    pub controller: AvrController,
    pub table: Arc<CommandTable>,
}

/// Builds the panel router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/connect", post(connect))
        .route("/api/disconnect", post(disconnect))
        .route("/api/status", get(status))
        .route("/api/command/:name", post(named_command))
        .route("/api/command", post(custom_command))
        .route("/ws/state", get(ws::state_ws))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn index(State(app): State<AppState>) -> Html<String> {
    Html(page::render_index(&app.table))
}

async fn connect(State(app): State<AppState>) -> Json<ConnectionResponse> {
    let success = match app.controller.connect().await {
        Ok(()) => true,
        Err(e) => {
            warn!("connect request failed: {e}");
            false
        }
    };
    Json(ConnectionResponse {
        success,
        connected: app.controller.is_connected(),
    })
}

async fn disconnect(State(app): State<AppState>) -> Json<ConnectionResponse> {
    app.controller.disconnect().await;
    Json(ConnectionResponse {
        success: true,
        connected: app.controller.is_connected(),
    })
}

async fn status(State(app): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected: app.controller.is_connected(),
        state: app.controller.current_state().await,
    })
}

/// Runs a predefined command from the table.
async fn named_command(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Json<CommandResponse> {
    let Some(spec) = app.table.lookup(&name) else {
        return Json(failure(&app, None, "unknown command".to_string()).await);
    };

    let outcome = app.controller.send_sequence(spec.sequence).await;
    Json(outcome_response(&app, Some(spec.sequence.to_string()), outcome).await)
}

/// Runs a free-form command after validation and sanitization.
async fn custom_command(
    State(app): State<AppState>,
    Json(req): Json<CustomCommandRequest>,
) -> Json<CommandResponse> {
    if req.command.is_empty() {
        return Json(failure(&app, None, "no command provided".to_string()).await);
    }

    if let Err(e) = validate_sequence(&req.command) {
        warn!("rejected custom command {:?}: {e}", req.command);
        return Json(failure(&app, None, format!("invalid command: {e}")).await);
    }

    // Sanitize line by line so macro separators survive.
    let sanitized = req
        .command
        .split('\n')
        .map(sanitize_command)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let outcome = app.controller.send_sequence(&sanitized).await;
    Json(outcome_response(&app, None, outcome).await)
}

// ── Response assembly ─────────────────────────────────────────────────────────

async fn outcome_response(
    app: &AppState,
    command: Option<String>,
    outcome: Result<String, ControllerError>,
) -> CommandResponse {
    match outcome {
        Ok(response) => CommandResponse {
            success: true,
            command,
            response: Some(response),
            error: None,
            connected: app.controller.is_connected(),
            state: app.controller.current_state().await,
        },
        Err(e) => failure(app, command, e.to_string()).await,
    }
}

async fn failure(app: &AppState, command: Option<String>, error: String) -> CommandResponse {
    CommandResponse {
        success: false,
        command,
        response: None,
        error: Some(error),
        connected: app.controller.is_connected(),
        state: app.controller.current_state().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
