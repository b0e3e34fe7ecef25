//! The tracked receiver state record.
//!
//! Every field starts unknown (`None`) and is filled in as replies are
//! observed. [`ReceiverState::apply`] reports whether a field actually
//! changed value; re-observing the same volume on every poll tick is not a
//! change and must not wake push subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::event::ReceiverEvent;

/// Snapshot of everything the panel knows about the receiver.
///
/// Serializes to the JSON shape pushed to browsers:
///
/// ```json
/// {"power":true,"volume":55,"muted":false,"input_source":"PHONO",
///  "surround_mode":null,"zone2_power":null,"zone2_volume":40,
///  "zone2_muted":false,"last_updated":"2026-08-06T12:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverState {
    /// Main zone power.
    pub power: Option<bool>,
    /// Main zone volume on the receiver's 00-98 scale.
    pub volume: Option<u8>,
    /// Main zone mute.
    pub muted: Option<bool>,
    /// Selected input source code, e.g. `"CD"` or `"CBL/SAT"`.
    pub input_source: Option<String>,
    /// Surround mode code, e.g. `"STEREO"`.
    pub surround_mode: Option<String>,
    /// Zone 2 power.
    pub zone2_power: Option<bool>,
    /// Zone 2 volume.
    pub zone2_volume: Option<u8>,
    /// Zone 2 mute.
    pub zone2_muted: Option<bool>,
    /// When any field last changed.
    pub last_updated: DateTime<Utc>,
}

impl Default for ReceiverState {
    fn default() -> Self {
        Self {
            power: None,
            volume: None,
            muted: None,
            input_source: None,
            surround_mode: None,
            zone2_power: None,
            zone2_volume: None,
            zone2_muted: None,
            last_updated: Utc::now(),
        }
    }
}

impl ReceiverState {
    /// Folds one event into the state.
    ///
    /// Returns `true` when a field changed value; `last_updated` is bumped
    /// only in that case.
    pub fn apply(&mut self, event: &ReceiverEvent) -> bool {
        let changed = match event {
            ReceiverEvent::Power(on) => set(&mut self.power, *on),
            ReceiverEvent::MainVolume(level) => set(&mut self.volume, *level),
            ReceiverEvent::Mute(on) => set(&mut self.muted, *on),
            ReceiverEvent::InputSource(source) => set(&mut self.input_source, source.clone()),
            ReceiverEvent::SurroundMode(mode) => set(&mut self.surround_mode, mode.clone()),
            ReceiverEvent::Zone2Power(on) => set(&mut self.zone2_power, *on),
            ReceiverEvent::Zone2Volume(level) => set(&mut self.zone2_volume, *level),
            ReceiverEvent::Zone2Mute(on) => set(&mut self.zone2_muted, *on),
        };
        if changed {
            self.last_updated = Utc::now();
        }
        changed
    }

    /// Parses a raw reply line and folds it in.
    ///
    /// Unrecognized lines leave the state untouched and return `false`.
    pub fn apply_line(&mut self, line: &str) -> bool {
        match ReceiverEvent::parse(line) {
            Some(event) => self.apply(&event),
            None => false,
        }
    }
}

/// Stores `value` into `slot`, reporting whether it differed.
fn set<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        false
    } else {
        *slot = Some(value);
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_all_unknown() {
        let state = ReceiverState::default();
        assert_eq!(state.power, None);
        assert_eq!(state.volume, None);
        assert_eq!(state.muted, None);
        assert_eq!(state.input_source, None);
        assert_eq!(state.surround_mode, None);
        assert_eq!(state.zone2_power, None);
        assert_eq!(state.zone2_volume, None);
        assert_eq!(state.zone2_muted, None);
    }

    #[test]
    fn test_apply_sets_field_and_reports_change() {
        let mut state = ReceiverState::default();
        assert!(state.apply(&ReceiverEvent::Power(true)));
        assert_eq!(state.power, Some(true));
    }

    #[test]
    fn test_reapplying_same_value_is_not_a_change() {
        // Arrange
        let mut state = ReceiverState::default();
        state.apply(&ReceiverEvent::MainVolume(55));
        let stamped = state.last_updated;

        // Act: the poll loop re-observes the same volume
        let changed = state.apply(&ReceiverEvent::MainVolume(55));

        // Assert: no change reported, timestamp untouched
        assert!(!changed);
        assert_eq!(state.last_updated, stamped);
    }

    #[test]
    fn test_changing_value_bumps_timestamp() {
        let mut state = ReceiverState::default();
        state.apply(&ReceiverEvent::MainVolume(55));
        let stamped = state.last_updated;

        let changed = state.apply(&ReceiverEvent::MainVolume(56));

        assert!(changed);
        assert!(state.last_updated >= stamped);
        assert_eq!(state.volume, Some(56));
    }

    #[test]
    fn test_apply_line_parses_and_applies() {
        let mut state = ReceiverState::default();
        assert!(state.apply_line("SIPHONO\r"));
        assert_eq!(state.input_source.as_deref(), Some("PHONO"));
    }

    #[test]
    fn test_apply_line_ignores_unrecognized() {
        let mut state = ReceiverState::default();
        assert!(!state.apply_line("CVFL 50"));
        assert_eq!(state, {
            let mut expected = ReceiverState::default();
            expected.last_updated = state.last_updated;
            expected
        });
    }

    #[test]
    fn test_zone2_fields_track_independently() {
        let mut state = ReceiverState::default();
        state.apply(&ReceiverEvent::MainVolume(55));
        state.apply(&ReceiverEvent::Zone2Volume(40));
        state.apply(&ReceiverEvent::Zone2Mute(true));

        assert_eq!(state.volume, Some(55));
        assert_eq!(state.zone2_volume, Some(40));
        assert_eq!(state.zone2_muted, Some(true));
        assert_eq!(state.muted, None);
    }

    #[test]
    fn test_state_serializes_unknown_fields_as_null() {
        let state = ReceiverState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["power"], serde_json::Value::Null);
        assert_eq!(json["volume"], serde_json::Value::Null);
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = ReceiverState::default();
        state.apply(&ReceiverEvent::Power(true));
        state.apply(&ReceiverEvent::MainVolume(67));
        state.apply(&ReceiverEvent::InputSource("PHONO".to_string()));

        let json = serde_json::to_string(&state).unwrap();
        let decoded: ReceiverState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, decoded);
    }
}
