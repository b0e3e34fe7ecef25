//! TCP line transport to the receiver.
//!
//! The receiver speaks `\r`-terminated ASCII lines over a plain TCP socket
//! (the classic telnet control port, without any telnet option negotiation).
//!
//! # Buffering
//!
//! TCP is a stream: one `read()` may return half a reply line, or several
//! replies at once when the receiver answers a burst of status queries.
//! [`AvrConnection`] accumulates incoming bytes and hands out one complete
//! line per [`LineTransport::read_line`] call; partial data survives a read
//! timeout and completes on the next call.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout_at;
use tracing::debug;

use avr_core::COMMAND_TERMINATOR;

use crate::application::transport::{Dial, LineTransport, TransportError};
use crate::domain::config::PanelConfig;

/// One TCP connection to the receiver.
pub struct AvrConnection {
    addr: String,
    read_half: OwnedReadHalf,
    write_half: OwnedWriteHalf,
    /// Bytes received but not yet consumed as complete lines.
    buf: Vec<u8>,
}

impl AvrConnection {
    /// Opens a TCP connection, bounded by `connect_timeout`.
    ///
    /// # Errors
    ///
    /// [`TransportError::ConnectTimeout`] when the handshake does not finish
    /// in time, [`TransportError::Io`] for refused connections and DNS
    /// failures.
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr.as_str()))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                addr: addr.clone(),
                timeout: connect_timeout,
            })?
            .map_err(|source| TransportError::Io {
                addr: addr.clone(),
                source,
            })?;

        debug!("opened receiver connection to {addr}");
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            addr,
            read_half,
            write_half,
            buf: Vec::with_capacity(256),
        })
    }

    /// Pops one terminated line off the buffer, trimmed of framing bytes.
    fn take_buffered_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == COMMAND_TERMINATOR as u8)?;
        let raw: Vec<u8> = self.buf.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }

    fn io_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Io {
            addr: self.addr.clone(),
            source,
        }
    }
}

#[async_trait]
impl LineTransport for AvrConnection {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line.as_bytes());
        framed.push(COMMAND_TERMINATOR as u8);

        self.write_half
            .write_all(&framed)
            .await
            .map_err(|source| TransportError::Io {
                addr: self.addr.clone(),
                source,
            })
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut tmp = [0u8; 1024];

        loop {
            // Serve from the buffer first; a previous read may have pulled
            // in more than one reply.
            while let Some(line) = self.take_buffered_line() {
                if !line.is_empty() {
                    return Ok(Some(line));
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }

            match timeout_at(deadline, self.read_half.read(&mut tmp)).await {
                // Timed out waiting; whatever partial line arrived stays
                // buffered for the next call.
                Err(_) => return Ok(None),
                Ok(Ok(0)) => return Err(TransportError::Closed),
                Ok(Ok(n)) => self.buf.extend_from_slice(&tmp[..n]),
                Ok(Err(source)) => return Err(self.io_error(source)),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.write_half.shutdown().await;
        debug!("closed receiver connection to {}", self.addr);
    }
}

// ── Dialer ────────────────────────────────────────────────────────────────────

/// Production [`Dial`] implementation: opens [`AvrConnection`]s.
pub struct TcpDial {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpDial {
    /// Builds a dialer from the panel configuration.
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            host: config.avr_host.clone(),
            port: config.avr_port,
            connect_timeout: config.connect_timeout,
        }
    }
}

#[async_trait]
impl Dial for TcpDial {
    async fn dial(&self) -> Result<Box<dyn LineTransport>, TransportError> {
        let conn = AvrConnection::connect(&self.host, self.port, self.connect_timeout).await?;
        Ok(Box::new(conn))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
