//! # avr-panel
//!
//! The DiscoAVR control-panel service: a thin web layer over one persistent
//! connection to an AV receiver.
//!
//! ```text
//! Browser  (HTML page + JSON over HTTP / WebSocket)
//!    ↕
//! avr-panel   ← this crate
//!   domain/          PanelConfig, browser-facing message types
//!   application/     AvrController (lifecycle, polling, state fan-out),
//!                    LineTransport seam
//!   infrastructure/  TCP line client, axum router, WebSocket sessions,
//!                    rendered button page
//!    ↕
//! AV receiver  (ASCII line protocol over TCP)
//! ```
//!
//! The controller owns the single receiver connection. Browser sessions share
//! it: HTTP handlers forward commands through the controller, and every
//! WebSocket session subscribes to the controller's state watch channel.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::controller::AvrController;
pub use domain::config::PanelConfig;
pub use infrastructure::http::{router, AppState};
