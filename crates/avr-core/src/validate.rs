//! Validation and sanitization for user-supplied command strings.
//!
//! Named commands from the table are trusted; these checks apply to the
//! free-form custom-command endpoint only, and run before anything reaches
//! the transport. A command must look like a receiver opcode: a short run of
//! uppercase letters, optionally followed by up to three digits or one of
//! the `UP`/`DOWN`/`ON`/`OFF` suffixes.

use thiserror::Error;

/// Maximum length of a single command.
pub const MAX_COMMAND_LEN: usize = 50;

/// Maximum total length of a multi-line command sequence.
pub const MAX_SEQUENCE_LEN: usize = MAX_COMMAND_LEN * 10;

/// Characters that must never appear in a command.
const FORBIDDEN_CHARS: &[char] = &[
    '\0', '\r', '\n', ';', '|', '&', '$', '`', '\\', '<', '>', '(', ')', '[', ']', '{', '}',
];

/// Rejection reasons for user-supplied commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    /// The command (or the whole sequence) is empty.
    #[error("command cannot be empty")]
    Empty,

    /// A single command exceeds [`MAX_COMMAND_LEN`].
    #[error("command exceeds maximum length of {MAX_COMMAND_LEN} characters")]
    TooLong,

    /// The sequence as a whole exceeds [`MAX_SEQUENCE_LEN`].
    #[error("command sequence is too long")]
    SequenceTooLong,

    /// The command contains a character from the forbidden set.
    #[error("command contains forbidden character {0:?}")]
    ForbiddenChar(char),

    /// The command does not look like a receiver opcode.
    #[error("command {0:?} does not match the expected shape")]
    BadShape(String),

    /// One command inside a multi-line sequence failed validation.
    #[error("invalid command {command:?}: {reason}")]
    InvalidInSequence {
        /// The offending line.
        command: String,
        /// Why it was rejected.
        reason: Box<ValidateError>,
    },
}

/// Validates a single command string.
///
/// # Errors
///
/// Returns the first applicable [`ValidateError`]: empty input, excessive
/// length, a forbidden character, or a shape mismatch.
pub fn validate_command(command: &str) -> Result<(), ValidateError> {
    if command.is_empty() {
        return Err(ValidateError::Empty);
    }
    if command.len() > MAX_COMMAND_LEN {
        return Err(ValidateError::TooLong);
    }
    if let Some(c) = command.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(ValidateError::ForbiddenChar(c));
    }
    if !matches_command_shape(command) {
        return Err(ValidateError::BadShape(command.to_string()));
    }
    Ok(())
}

/// Strips whitespace, control characters, and forbidden characters, then
/// uppercases (receiver opcodes are uppercase ASCII).
///
/// Sanitizing does not guarantee validity; run [`validate_command`] on the
/// result.
pub fn sanitize_command(command: &str) -> String {
    command
        .trim()
        .chars()
        .filter(|c| *c >= ' ' && !FORBIDDEN_CHARS.contains(c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Validates a command sequence: one or more commands separated by newlines.
///
/// Blank lines are skipped, matching how the controller sends sequences.
///
/// # Errors
///
/// Returns [`ValidateError::Empty`] when no non-blank command remains,
/// [`ValidateError::SequenceTooLong`] on an oversized sequence, or
/// [`ValidateError::InvalidInSequence`] naming the first bad line.
pub fn validate_sequence(sequence: &str) -> Result<(), ValidateError> {
    if sequence.len() > MAX_SEQUENCE_LEN {
        return Err(ValidateError::SequenceTooLong);
    }

    let mut seen_any = false;
    for line in sequence.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        seen_any = true;
        validate_command(line).map_err(|reason| ValidateError::InvalidInSequence {
            command: line.to_string(),
            reason: Box::new(reason),
        })?;
    }

    if seen_any {
        Ok(())
    } else {
        Err(ValidateError::Empty)
    }
}

/// Accepted command shapes:
///
/// - 2 to 10 uppercase letters (`PWON`, `PWSTANDBY`, `MVUP`)
/// - the above followed by 1 to 3 digits (`MV55`, `Z240`, `SIAUX1` is covered
///   by letters + digit)
/// - an opcode of up to 10 letters carrying a `UP`/`DOWN`/`ON`/`OFF` suffix
///   even when the combined length exceeds 10 letters
fn matches_command_shape(command: &str) -> bool {
    let letters = command
        .chars()
        .take_while(|c| c.is_ascii_uppercase())
        .count();
    let rest = &command[letters..];

    if rest.is_empty() {
        if (2..=10).contains(&letters) {
            return true;
        }
        // Long all-letter commands are only valid as opcode + known suffix.
        for suffix in ["DOWN", "OFF", "UP", "ON"] {
            if let Some(stem) = command.strip_suffix(suffix) {
                if (2..=10).contains(&stem.len())
                    && stem.chars().all(|c| c.is_ascii_uppercase())
                {
                    return true;
                }
            }
        }
        return false;
    }

    (2..=10).contains(&letters) && rest.len() <= 3 && rest.chars().all(|c| c.is_ascii_digit())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
