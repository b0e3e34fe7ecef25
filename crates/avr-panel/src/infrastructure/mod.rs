//! Infrastructure: the TCP transport and the browser-facing web surface.

pub mod avr_conn;
pub mod http;
pub mod page;
pub mod ws;

pub use avr_conn::{AvrConnection, TcpDial};
pub use http::{router, AppState};
