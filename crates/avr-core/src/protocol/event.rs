//! Typed parsing of receiver reply lines.
//!
//! Replies are matched by fixed prefix. Volume codes carry the level in the
//! first two digits after the prefix; a third digit (half-dB step, e.g.
//! `MV675`) is dropped. Unrecognized lines parse to `None` and are ignored
//! by callers; the receiver emits many codes this panel does not track.

use tracing::trace;

/// One parsed state observation from the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverEvent {
    /// Main zone power (`PWON` / `PWSTANDBY`).
    Power(bool),
    /// Main zone volume 00-99 (`MV<dd>`).
    MainVolume(u8),
    /// Main zone mute (`MUON` / `MUOFF`).
    Mute(bool),
    /// Selected input source (`SI<name>`).
    InputSource(String),
    /// Surround mode (`MS<name>`).
    SurroundMode(String),
    /// Zone 2 power (`Z2ON` / `Z2OFF`).
    Zone2Power(bool),
    /// Zone 2 volume 00-99 (`Z2<dd>`).
    Zone2Volume(u8),
    /// Zone 2 mute (`Z2MUON` / `Z2MUOFF`).
    Zone2Mute(bool),
}

impl ReceiverEvent {
    /// Parses one reply line into an event.
    ///
    /// The line is trimmed first (replies arrive `\r`-terminated). Returns
    /// `None` for anything the panel does not track.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        // Exact codes first: Z2MUON must never fall through to the Z2
        // volume branch below.
        match line {
            "PWON" => return Some(Self::Power(true)),
            "PWSTANDBY" => return Some(Self::Power(false)),
            "MUON" => return Some(Self::Mute(true)),
            "MUOFF" => return Some(Self::Mute(false)),
            "Z2ON" => return Some(Self::Zone2Power(true)),
            "Z2OFF" => return Some(Self::Zone2Power(false)),
            "Z2MUON" => return Some(Self::Zone2Mute(true)),
            "Z2MUOFF" => return Some(Self::Zone2Mute(false)),
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("MV") {
            if let Some(volume) = leading_two_digits(rest) {
                return Some(Self::MainVolume(volume));
            }
            // MVMAX and friends are informational; skip them.
            trace!("ignoring unparsed MV reply: {line:?}");
            return None;
        }

        if let Some(rest) = line.strip_prefix("Z2") {
            if let Some(volume) = leading_two_digits(rest) {
                return Some(Self::Zone2Volume(volume));
            }
            trace!("ignoring unparsed Z2 reply: {line:?}");
            return None;
        }

        if let Some(rest) = line.strip_prefix("SI") {
            if !rest.is_empty() {
                return Some(Self::InputSource(rest.to_string()));
            }
        }

        if let Some(rest) = line.strip_prefix("MS") {
            if !rest.is_empty() {
                return Some(Self::SurroundMode(rest.to_string()));
            }
        }

        trace!("ignoring unrecognized reply: {line:?}");
        None
    }
}

/// Reads a two-digit decimal value from the start of `s`.
fn leading_two_digits(s: &str) -> Option<u8> {
    match s.as_bytes() {
        &[a, b, ..] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some((a - b'0') * 10 + (b - b'0'))
        }
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_and_standby() {
        assert_eq!(ReceiverEvent::parse("PWON"), Some(ReceiverEvent::Power(true)));
        assert_eq!(
            ReceiverEvent::parse("PWSTANDBY"),
            Some(ReceiverEvent::Power(false))
        );
    }

    #[test]
    fn test_main_volume_two_digits() {
        assert_eq!(
            ReceiverEvent::parse("MV55"),
            Some(ReceiverEvent::MainVolume(55))
        );
    }

    #[test]
    fn test_main_volume_half_db_reply_keeps_two_digits() {
        // MV675 means 67.5 on the receiver; the half-dB digit is dropped.
        assert_eq!(
            ReceiverEvent::parse("MV675"),
            Some(ReceiverEvent::MainVolume(67))
        );
    }

    #[test]
    fn test_mv_max_report_ignored() {
        assert_eq!(ReceiverEvent::parse("MVMAX 80"), None);
    }

    #[test]
    fn test_mute_codes() {
        assert_eq!(ReceiverEvent::parse("MUON"), Some(ReceiverEvent::Mute(true)));
        assert_eq!(ReceiverEvent::parse("MUOFF"), Some(ReceiverEvent::Mute(false)));
    }

    #[test]
    fn test_input_source_carries_suffix() {
        assert_eq!(
            ReceiverEvent::parse("SICBL/SAT"),
            Some(ReceiverEvent::InputSource("CBL/SAT".to_string()))
        );
    }

    #[test]
    fn test_bare_si_prefix_ignored() {
        assert_eq!(ReceiverEvent::parse("SI"), None);
    }

    #[test]
    fn test_surround_mode_carries_suffix() {
        assert_eq!(
            ReceiverEvent::parse("MSSTEREO"),
            Some(ReceiverEvent::SurroundMode("STEREO".to_string()))
        );
    }

    #[test]
    fn test_zone2_power_codes() {
        assert_eq!(
            ReceiverEvent::parse("Z2ON"),
            Some(ReceiverEvent::Zone2Power(true))
        );
        assert_eq!(
            ReceiverEvent::parse("Z2OFF"),
            Some(ReceiverEvent::Zone2Power(false))
        );
    }

    #[test]
    fn test_zone2_volume() {
        assert_eq!(
            ReceiverEvent::parse("Z240"),
            Some(ReceiverEvent::Zone2Volume(40))
        );
    }

    #[test]
    fn test_zone2_mute_is_not_zone2_volume() {
        // Z2MUON starts with Z2 but must parse as mute, not volume.
        assert_eq!(
            ReceiverEvent::parse("Z2MUON"),
            Some(ReceiverEvent::Zone2Mute(true))
        );
        assert_eq!(
            ReceiverEvent::parse("Z2MUOFF"),
            Some(ReceiverEvent::Zone2Mute(false))
        );
    }

    #[test]
    fn test_trailing_carriage_return_trimmed() {
        assert_eq!(
            ReceiverEvent::parse("MV55\r"),
            Some(ReceiverEvent::MainVolume(55))
        );
    }

    #[test]
    fn test_unrecognized_reply_ignored() {
        assert_eq!(ReceiverEvent::parse("CVFL 50"), None);
        assert_eq!(ReceiverEvent::parse(""), None);
    }
}
