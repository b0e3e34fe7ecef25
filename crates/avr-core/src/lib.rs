//! # avr-core
//!
//! Shared library for DiscoAVR containing the receiver command table, the
//! command validator, and the line-protocol state tracker.
//!
//! This crate is used by the control-panel service and by its tests. It has
//! zero dependencies on sockets, OS APIs, or web frameworks.
//!
//! The receiver speaks a simple ASCII line protocol (Denon/Marantz style):
//! a command is a short uppercase code terminated by a carriage return, for
//! example `PWON\r` or `MV55\r`. Status replies use the same codes, so the
//! parser in [`protocol`] is shared between command echoes and poll replies.
//!
//! - **`commands`** – the static name → protocol-string table that drives the
//!   web UI, including multi-command macros and button grouping metadata.
//! - **`validate`** – sanity checks applied to user-supplied command strings
//!   before they may reach the transport.
//! - **`protocol`** – reply-code parsing ([`ReceiverEvent`]) and the typed
//!   state record ([`ReceiverState`]) built from observed replies.

pub mod commands;
pub mod protocol;
pub mod validate;

// Re-export the most-used types at the crate root so callers can write
// `avr_core::ReceiverState` instead of `avr_core::protocol::state::ReceiverState`.
pub use commands::{CommandGroup, CommandSpec, CommandTable, COMMAND_GROUPS};
pub use protocol::event::ReceiverEvent;
pub use protocol::state::ReceiverState;
pub use protocol::{COMMAND_TERMINATOR, MACRO_SEPARATOR, STATUS_QUERIES};
pub use validate::{sanitize_command, validate_command, validate_sequence, ValidateError};
