//! JSON message types for the browser-facing protocol.
//!
//! Two surfaces share these shapes:
//!
//! - HTTP endpoints return [`CommandResponse`] / [`StatusResponse`] /
//!   [`ConnectionResponse`] bodies.
//! - The `/ws/state` push channel carries [`PushMsg`] frames to the browser
//!   and accepts [`ClientMsg`] frames from it.
//!
//! Every WebSocket frame is a JSON object with a `"type"` discriminant,
//! handled by serde's `#[serde(tag = "type")]`:
//!
//! ```json
//! {"type":"state_update","connected":true,"state":{...}}
//! {"type":"ping"}
//! {"type":"pong"}
//! ```

use avr_core::ReceiverState;
use serde::{Deserialize, Serialize};

/// The controller's published view: connection flag plus receiver state.
///
/// This is the value carried on the controller's watch channel; the push
/// channel forwards it verbatim inside [`PushMsg::StateUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Whether the panel currently holds a receiver connection.
    pub connected: bool,
    /// Last known receiver state.
    pub state: ReceiverState,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            connected: false,
            state: ReceiverState::default(),
        }
    }
}

// ── WebSocket frames ──────────────────────────────────────────────────────────

/// Frames the panel pushes to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMsg {
    /// The receiver state changed (or a session just attached).
    StateUpdate {
        connected: bool,
        state: ReceiverState,
    },
    /// Keep-alive reply to a [`ClientMsg::Ping`].
    Pong,
}

impl From<StateSnapshot> for PushMsg {
    fn from(snapshot: StateSnapshot) -> Self {
        PushMsg::StateUpdate {
            connected: snapshot.connected,
            state: snapshot.state,
        }
    }
}

/// Frames the browser may send on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Keep-alive probe; answered with [`PushMsg::Pong`].
    Ping,
}

// ── HTTP bodies ───────────────────────────────────────────────────────────────

/// Body of `POST /api/connect` and `POST /api/disconnect` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub connected: bool,
}

/// Body of `GET /api/status` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub connected: bool,
    pub state: ReceiverState,
}

/// Body of both command endpoints' responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    /// The protocol string that was sent (named commands only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Joined reply lines, when the receiver answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Why the command was not sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub connected: bool,
    pub state: ReceiverState,
}

/// Body of `POST /api/command` requests.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomCommandRequest {
    #[serde(default)]
    pub command: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
