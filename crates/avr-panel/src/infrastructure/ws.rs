//! The WebSocket push channel.
//!
//! Each browser session that attaches to `/ws/state` gets its own task.
//! A session:
//!
//! 1. receives the current snapshot immediately on attach,
//! 2. receives one `state_update` frame whenever the controller publishes a
//!    change, and
//! 3. may send `{"type":"ping"}` frames, answered with `{"type":"pong"}`.
//!
//! Sessions observe the controller through its watch channel, so any number
//! of browsers can attach without the controller knowing about them, and a
//! slow session only skips intermediate snapshots rather than applying
//! backpressure to the poll loop.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::messages::{ClientMsg, PushMsg};
use crate::infrastructure::http::AppState;

/// `GET /ws/state` upgrade handler.
pub async fn state_ws(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, app))
}

/// Runs one browser session until it disconnects.
async fn handle_session(socket: WebSocket, app: AppState) {
    let session_id = Uuid::new_v4();
    info!("state session {session_id} attached");

    let (mut sink, mut stream) = socket.split();
    let mut updates = app.controller.subscribe();

    // Initial snapshot so the page renders without waiting for a change.
    let initial = PushMsg::from(updates.borrow_and_update().clone());
    if send_push(&mut sink, &initial).await.is_err() {
        debug!("state session {session_id}: failed before first frame");
        return;
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    // Controller dropped; the service is shutting down.
                    break;
                }
                let push = PushMsg::from(updates.borrow_and_update().clone());
                if send_push(&mut sink, &push).await.is_err() {
                    debug!("state session {session_id}: push failed (browser gone)");
                    break;
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(ClientMsg::Ping) => {
                                if send_push(&mut sink, &PushMsg::Pong).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // One bad frame is not worth the session.
                                warn!("state session {session_id}: invalid frame: {e}");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Protocol-level ping/pong is handled by axum; binary
                    // frames are not part of this protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("state session {session_id}: socket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    info!("state session {session_id} detached");
}

async fn send_push(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &PushMsg,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json)).await,
        Err(e) => {
            // Push messages are plain data; this indicates a bug, not a
            // session problem. Keep the session alive.
            tracing::error!("push serialization error: {e}");
            Ok(())
        }
    }
}
