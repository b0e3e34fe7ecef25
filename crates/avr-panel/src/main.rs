//! DiscoAVR control panel — entry point.
//!
//! Serves a small web page of remote-control buttons and relays them to an
//! AV receiver's text control protocol over TCP. One persistent receiver
//! connection is shared by all browsers; state changes observed on it are
//! pushed to every attached browser over WebSocket.
//!
//! # Usage
//!
//! ```text
//! avr-panel [OPTIONS]
//!
//! Options:
//!   --avr-host <HOST>          Receiver hostname or IP [default: 192.168.1.100]
//!   --avr-port <PORT>          Receiver control port [default: 60128]
//!   --avr-timeout <SECS>       Receiver connect timeout [default: 5]
//!   --host <HOST>              Web server bind host [default: 0.0.0.0]
//!   --port <PORT>              Web server port [default: 8080]
//!   --poll-interval-ms <MS>    Status poll interval [default: 2000]
//!   --debug                    Simulate the receiver (no socket)
//!   --config <FILE>            Optional TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! Each flag falls back to an environment variable when absent; CLI args
//! take precedence over the environment, and both take precedence over the
//! config file.
//!
//! | Variable               | Flag                 |
//! |------------------------|----------------------|
//! | `AVR_HOST`             | `--avr-host`         |
//! | `AVR_PORT`             | `--avr-port`         |
//! | `AVR_TIMEOUT`          | `--avr-timeout`      |
//! | `HOST`                 | `--host`             |
//! | `PORT`                 | `--port`             |
//! | `AVR_POLL_INTERVAL_MS` | `--poll-interval-ms` |
//! | `AVR_DEBUG`            | `--debug`            |
//! | `AVR_PANEL_CONFIG`     | `--config`           |

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use avr_core::CommandTable;
use avr_panel::domain::config::{FileConfig, Overrides, PanelConfig};
use avr_panel::infrastructure::avr_conn::TcpDial;
use avr_panel::{router, AppState, AvrController};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// DiscoAVR control panel.
///
/// Relays browser button presses to an AV receiver over TCP and pushes
/// receiver state changes back to the browser.
#[derive(Debug, Parser)]
#[command(
    name = "avr-panel",
    about = "Web control panel for a network AV receiver",
    version
)]
struct Cli {
    /// Receiver hostname or IP address.
    #[arg(long, env = "AVR_HOST")]
    avr_host: Option<String>,

    /// Receiver control port.
    #[arg(long, env = "AVR_PORT")]
    avr_port: Option<u16>,

    /// Receiver connect timeout in seconds.
    #[arg(long, env = "AVR_TIMEOUT")]
    avr_timeout: Option<u64>,

    /// Host the web server binds to.
    ///
    /// `0.0.0.0` accepts connections from any interface; use `127.0.0.1`
    /// for local-only access.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port the web server listens on.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Status poll interval in milliseconds.
    #[arg(long, env = "AVR_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Simulate the receiver instead of opening a socket.
    ///
    /// Connects always succeed and commands update the state record
    /// directly, so the UI can be tried without hardware.
    #[arg(long, env = "AVR_DEBUG")]
    debug: bool,

    /// Optional TOML config file (lowest-precedence settings source).
    #[arg(long, env = "AVR_PANEL_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            http_host: self.host.clone(),
            http_port: self.port,
            avr_host: self.avr_host.clone(),
            avr_port: self.avr_port,
            connect_timeout_secs: self.avr_timeout,
            poll_interval_ms: self.poll_interval_ms,
            debug: self.debug,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG, falling back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => Some(
            FileConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
        ),
        None => None,
    };
    let config = PanelConfig::resolve(cli.overrides(), file.as_ref());

    info!(
        "DiscoAVR panel starting — web={}, receiver={}",
        config.http_addr(),
        config.avr_addr()
    );
    if config.debug_mode {
        info!("debug mode: commands will be simulated, not sent to a receiver");
    }

    let controller = AvrController::new(config.clone(), Box::new(TcpDial::from_config(&config)));
    let state = AppState {
        controller: controller.clone(),
        table: Arc::new(CommandTable::standard()),
    };

    let listener = tokio::net::TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("failed to bind web listener on {}", config.http_addr()))?;
    info!("web interface listening on http://{}", config.http_addr());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("web server error")?;

    // Drop the receiver connection cleanly on the way out.
    controller.disconnect().await;
    info!("DiscoAVR panel stopped");
    Ok(())
}

/// Resolves when Ctrl+C (SIGINT) is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C — shutting down"),
        Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
