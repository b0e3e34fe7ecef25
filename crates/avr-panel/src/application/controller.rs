//! The receiver controller.
//!
//! Owns the single connection to the receiver and everything that happens on
//! it:
//!
//! - **Lifecycle** – `connect` (with exponential backoff), `disconnect`,
//!   `is_connected`.
//! - **Commands** – forwards command strings verbatim, reads the optional
//!   reply line, and retries once over a fresh connection when a send fails.
//! - **Polling** – a background task issues the status queries every
//!   `poll_interval` and folds the replies into the state record.
//! - **Fan-out** – publishes `{connected, state}` snapshots on a watch
//!   channel whenever a field changes; each WebSocket session holds a
//!   receiver. Watch semantics mean a slow session only ever misses
//!   intermediate snapshots, never blocks the controller.
//!
//! In debug mode no socket is opened; commands are simulated against the
//! state record so the web UI can be exercised without hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use avr_core::{ReceiverEvent, ReceiverState, MACRO_SEPARATOR, STATUS_QUERIES};

use crate::application::transport::{Dial, LineTransport, TransportError};
use crate::domain::config::PanelConfig;
use crate::domain::messages::StateSnapshot;

/// Gap between consecutive status queries within one poll cycle.
const QUERY_GAP: Duration = Duration::from_millis(50);

/// Per-read timeout while draining poll replies.
const DRAIN_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Total budget for draining replies after a round of status queries.
const DRAIN_BUDGET: Duration = Duration::from_secs(1);

/// Errors surfaced to the web layer.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// All connect attempts failed.
    #[error("could not reach the receiver: {0}")]
    Connect(#[source] TransportError),

    /// A transport operation failed and the retry budget was spent.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Handle to the shared controller. Cheap to clone; all clones drive the
/// same connection.
#[derive(Clone)]
pub struct AvrController {
    inner: Arc<Inner>,
}

struct Inner {
    config: PanelConfig,
    dialer: Box<dyn Dial>,
    conn: Mutex<Option<Box<dyn LineTransport>>>,
    connected: AtomicBool,
    last_error: Mutex<Option<String>>,
    state: Mutex<ReceiverState>,
    updates: watch::Sender<StateSnapshot>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl AvrController {
    /// Creates a controller. `dialer` opens receiver connections on demand;
    /// pass a `TcpDial` in production.
    pub fn new(config: PanelConfig, dialer: Box<dyn Dial>) -> Self {
        let (updates, _) = watch::channel(StateSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                config,
                dialer,
                conn: Mutex::new(None),
                connected: AtomicBool::new(false),
                last_error: Mutex::new(None),
                state: Mutex::new(ReceiverState::default()),
                updates,
                poll_task: Mutex::new(None),
            }),
        }
    }

    /// Whether a receiver connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    /// The most recent connect/transport failure, for status reporting.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().await.clone()
    }

    /// A copy of the current receiver state.
    pub async fn current_state(&self) -> ReceiverState {
        self.inner.state.lock().await.clone()
    }

    /// Subscribes to state snapshots. The receiver immediately holds the
    /// latest value; `changed()` resolves on each subsequent publish.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.inner.updates.subscribe()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Connects to the receiver, retrying with exponential backoff.
    ///
    /// On success the status poll task is running and the initial status
    /// queries have been issued.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Connect`] after the final failed attempt.
    pub async fn connect(&self) -> Result<(), ControllerError> {
        self.connect_with_retry(true).await
    }

    async fn connect_with_retry(&self, retry: bool) -> Result<(), ControllerError> {
        if self.inner.config.debug_mode {
            info!(
                "debug mode: simulating connection to {}",
                self.inner.config.avr_addr()
            );
            self.inner.connected.store(true, Ordering::Relaxed);
            self.set_last_error(None).await;
            self.start_polling().await;
            self.publish().await;
            return Ok(());
        }

        let attempts = if retry {
            self.inner.config.max_retries + 1
        } else {
            1
        };
        let mut delay = self.inner.config.initial_retry_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.inner.dialer.dial().await {
                Ok(transport) => {
                    let previous = self.inner.conn.lock().await.replace(transport);
                    if let Some(mut old) = previous {
                        old.close().await;
                    }
                    self.inner.connected.store(true, Ordering::Relaxed);
                    self.set_last_error(None).await;
                    info!("connected to receiver at {}", self.inner.config.avr_addr());

                    self.start_polling().await;
                    // Prime the state record before reporting success.
                    self.request_status().await;
                    self.publish().await;
                    return Ok(());
                }
                Err(e) => {
                    warn!("connect attempt {attempt}/{attempts} failed: {e}");
                    self.set_last_error(Some(e.to_string())).await;
                    self.inner.connected.store(false, Ordering::Relaxed);
                    if attempt >= attempts {
                        return Err(ControllerError::Connect(e));
                    }
                    debug!("retrying in {delay:?}");
                    sleep(delay).await;
                    delay = (delay * 2).min(self.inner.config.max_retry_delay);
                }
            }
        }
    }

    /// Disconnects and stops the poll task.
    pub async fn disconnect(&self) {
        self.stop_polling().await;

        if self.inner.config.debug_mode {
            info!("debug mode: simulating disconnect");
            self.inner.connected.store(false, Ordering::Relaxed);
            self.publish().await;
            return;
        }

        if let Some(mut conn) = self.inner.conn.lock().await.take() {
            conn.close().await;
        }
        self.inner.connected.store(false, Ordering::Relaxed);
        info!("disconnected from receiver");
        self.publish().await;
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Sends one command verbatim and returns the reply line, if any.
    ///
    /// Connects first when necessary. A send failure marks the connection
    /// dead and triggers one reconnect-and-resend before giving up.
    ///
    /// # Errors
    ///
    /// Returns a connect error when no connection could be established, or
    /// the transport error once the resend budget is spent.
    pub async fn send_command(&self, command: &str) -> Result<Option<String>, ControllerError> {
        let mut resend_remaining = true;
        loop {
            if !self.is_connected() {
                self.connect_with_retry(true).await?;
            }

            if self.inner.config.debug_mode {
                debug!("debug mode: simulating command {command:?}");
                self.simulate(command).await;
                return Ok(None);
            }

            match self.write_and_collect(command).await {
                Ok(reply) => {
                    info!("sent command {command:?}");
                    if let Some(line) = &reply {
                        debug!("reply to {command:?}: {line:?}");
                        self.absorb_reply(line).await;
                    }
                    return Ok(reply);
                }
                Err(e) => {
                    warn!("failed to send {command:?}: {e}");
                    self.mark_disconnected(&e).await;
                    if !resend_remaining {
                        return Err(ControllerError::Transport(e));
                    }
                    resend_remaining = false;
                    info!("reconnecting to resend {command:?}");
                }
            }
        }
    }

    /// Sends a macro: commands separated by `\n`, with the configured gap in
    /// between. Collected replies are joined with `"; "`.
    ///
    /// # Errors
    ///
    /// Stops at the first command that cannot be delivered.
    pub async fn send_sequence(&self, sequence: &str) -> Result<String, ControllerError> {
        let mut replies = Vec::new();
        let mut first = true;

        for command in sequence.split(MACRO_SEPARATOR) {
            let command = command.trim();
            if command.is_empty() {
                continue;
            }
            if !first {
                sleep(self.inner.config.command_gap).await;
            }
            first = false;

            if let Some(reply) = self.send_command(command).await? {
                replies.push(reply);
            }
        }

        if replies.is_empty() {
            Ok("Commands sent".to_string())
        } else {
            Ok(replies.join("; "))
        }
    }

    async fn write_and_collect(&self, command: &str) -> Result<Option<String>, TransportError> {
        let mut guard = self.inner.conn.lock().await;
        let conn = guard.as_mut().ok_or(TransportError::Closed)?;
        conn.send_line(command).await?;
        conn.read_line(self.inner.config.reply_timeout).await
    }

    // ── Status polling ────────────────────────────────────────────────────────

    async fn start_polling(&self) {
        let mut guard = self.inner.poll_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        let controller = self.clone();
        *guard = Some(tokio::spawn(async move {
            controller.poll_loop().await;
        }));
    }

    async fn stop_polling(&self) {
        if let Some(handle) = self.inner.poll_task.lock().await.take() {
            handle.abort();
        }
    }

    async fn poll_loop(self) {
        debug!("status polling started");
        let mut ticker = interval(self.inner.config.poll_interval);
        // Draining replies can overrun a tick; don't burst to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; connect already primed the state.
        ticker.tick().await;

        while self.is_connected() {
            ticker.tick().await;
            if !self.is_connected() {
                break;
            }
            self.request_status().await;
        }
        debug!("status polling stopped");
    }

    /// Issues the status queries and folds the replies into the state.
    async fn request_status(&self) {
        if self.inner.config.debug_mode || !self.is_connected() {
            return;
        }
        if let Err(e) = self.run_status_cycle().await {
            warn!("status poll failed: {e}");
            self.mark_disconnected(&e).await;
        }
    }

    async fn run_status_cycle(&self) -> Result<(), TransportError> {
        let replies = {
            let mut guard = self.inner.conn.lock().await;
            let Some(conn) = guard.as_mut() else {
                return Ok(());
            };

            for query in STATUS_QUERIES {
                conn.send_line(query).await?;
                sleep(QUERY_GAP).await;
            }

            // The receiver answers the queries as separate lines in its own
            // time; drain until it goes quiet or the budget is spent.
            let mut replies = Vec::new();
            let deadline = Instant::now() + DRAIN_BUDGET;
            while Instant::now() < deadline {
                match conn.read_line(DRAIN_READ_TIMEOUT).await? {
                    Some(line) => replies.push(line),
                    None => break,
                }
            }
            replies
        };

        for line in &replies {
            self.absorb_reply(line).await;
        }
        Ok(())
    }

    // ── State plumbing ────────────────────────────────────────────────────────

    async fn absorb_reply(&self, line: &str) {
        let changed = self.inner.state.lock().await.apply_line(line);
        if changed {
            self.publish().await;
        }
    }

    /// Applies a command to the state record as if the receiver had echoed
    /// it. Relative volume steps have no reply-code equivalent and are
    /// stepped directly.
    async fn simulate(&self, command: &str) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            match command {
                "MVUP" => {
                    let next = stepped(state.volume, 1);
                    state.apply(&ReceiverEvent::MainVolume(next))
                }
                "MVDOWN" => {
                    let next = stepped(state.volume, -1);
                    state.apply(&ReceiverEvent::MainVolume(next))
                }
                "Z2UP" => {
                    let next = stepped(state.zone2_volume, 1);
                    state.apply(&ReceiverEvent::Zone2Volume(next))
                }
                "Z2DOWN" => {
                    let next = stepped(state.zone2_volume, -1);
                    state.apply(&ReceiverEvent::Zone2Volume(next))
                }
                other => state.apply_line(other),
            }
        };
        if changed {
            self.publish().await;
        }
    }

    async fn mark_disconnected(&self, error: &TransportError) {
        self.set_last_error(Some(error.to_string())).await;
        self.inner.connected.store(false, Ordering::Relaxed);
        if let Some(mut conn) = self.inner.conn.lock().await.take() {
            conn.close().await;
        }
        self.publish().await;
    }

    async fn set_last_error(&self, error: Option<String>) {
        *self.inner.last_error.lock().await = error;
    }

    async fn publish(&self) {
        let state = self.inner.state.lock().await.clone();
        let snapshot = StateSnapshot {
            connected: self.is_connected(),
            state,
        };
        let _ = self.inner.updates.send_replace(snapshot);
    }
}

/// One volume step on the 0-98 scale, defaulting to 50 when unknown.
fn stepped(current: Option<u8>, delta: i16) -> u8 {
    (i16::from(current.unwrap_or(50)) + delta).clamp(0, 98) as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────
