//! The transport seam between the controller and the receiver socket.
//!
//! The controller only ever needs two operations: write one command line and
//! wait briefly for one reply line. Putting them behind [`LineTransport`]
//! (and connection establishment behind [`Dial`]) keeps the controller free
//! of socket code and lets tests drive it with mocks.
//!
//! The TCP implementations live in `infrastructure::avr_conn`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connect did not complete within the configured timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// A socket-level error while connecting, writing, or reading.
    #[error("I/O error talking to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The receiver closed the connection (EOF on read).
    #[error("connection closed by receiver")]
    Closed,
}

/// One established line-oriented connection to the receiver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LineTransport: Send + Sync {
    /// Writes one command line, appending the protocol terminator.
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Waits up to `timeout` for one terminated reply line.
    ///
    /// Returns `Ok(None)` when nothing arrived in time; many commands are
    /// never answered and callers treat silence as success.
    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, TransportError>;

    /// Shuts the connection down. Errors during teardown are ignored.
    async fn close(&mut self);
}

/// Connection factory handed to the controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dial: Send + Sync {
    /// Opens a fresh connection to the receiver.
    async fn dial(&self) -> Result<Box<dyn LineTransport>, TransportError>;
}
