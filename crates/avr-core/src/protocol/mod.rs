//! The receiver's ASCII line protocol.
//!
//! Commands and replies are short uppercase codes. On the wire a command is
//! terminated by a carriage return (`PWON\r`); replies arrive the same way.
//! Multi-command macros in the command table use `\n` as an internal
//! separator and are split before transmission.
//!
//! The receiver answers status queries (and echoes accepted commands) with
//! the same fixed-prefix codes, so one parser serves both paths:
//! [`event::ReceiverEvent::parse`] turns a reply line into a typed event and
//! [`state::ReceiverState::apply`] folds events into the tracked state.

pub mod event;
pub mod state;

/// Terminator appended to every command written to the receiver, and the
/// delimiter replies are read up to.
pub const COMMAND_TERMINATOR: char = '\r';

/// Separator between the individual commands of a table macro.
pub const MACRO_SEPARATOR: char = '\n';

/// Status queries issued on connect and on every poll tick.
///
/// Each query makes the receiver report one state dimension: main volume,
/// main mute, main power, and input source. The replies are plain state
/// codes (`MV55`, `MUOFF`, ...) handled by the normal reply parser.
pub const STATUS_QUERIES: &[&str] = &["MV?", "MU?", "PW?", "SI?"];
