//! The receiver command table.
//!
//! Maps symbolic command names (used in URLs and the web UI) to the literal
//! protocol strings sent to the receiver. A table value may contain several
//! protocol commands separated by `\n`; the controller sends them one at a
//! time with a short gap in between. The codes below are common
//! Denon/Marantz commands; adjust for other receiver models.
//!
//! [`COMMAND_GROUPS`] carries the UI metadata: which buttons appear in which
//! section of the rendered page, in display order, with human-readable
//! labels. A command may exist in the table without appearing in any group
//! (it is then reachable via the API but has no button).

use std::collections::HashMap;

/// One named command: the UI label and the protocol string(s) it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Symbolic name used in API routes, e.g. `"power_on"`.
    pub name: &'static str,
    /// Button label shown in the web UI.
    pub label: &'static str,
    /// Protocol command(s); multi-command macros are separated by `\n`.
    pub sequence: &'static str,
}

/// An ordered UI section holding references into the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandGroup {
    /// Stable key, e.g. `"main_volume"`.
    pub key: &'static str,
    /// Section heading shown in the web UI.
    pub title: &'static str,
    /// Member command names in display order.
    pub commands: &'static [&'static str],
}

/// Every command the panel knows about.
const COMMANDS: &[CommandSpec] = &[
    // Presets / scenes
    CommandSpec {
        name: "preset_vinyl",
        label: "Vinyl",
        sequence: "SIPHONO\nMUOFF\nZ2MUOFF\nMV67\nZ267",
    },
    // Power
    CommandSpec { name: "power_on", label: "Power On", sequence: "PWON" },
    CommandSpec { name: "power_off", label: "Power Off", sequence: "PWSTANDBY" },
    // Main-zone volume
    CommandSpec { name: "volume_up", label: "Vol +", sequence: "MVUP" },
    CommandSpec { name: "volume_down", label: "Vol -", sequence: "MVDOWN" },
    CommandSpec {
        name: "volume_up_5",
        label: "Vol ++",
        sequence: "MVUP\nMVUP\nMVUP\nMVUP\nMVUP",
    },
    CommandSpec {
        name: "volume_down_5",
        label: "Vol --",
        sequence: "MVDOWN\nMVDOWN\nMVDOWN\nMVDOWN\nMVDOWN",
    },
    CommandSpec { name: "volume_40", label: "Vol 40", sequence: "MV40" },
    CommandSpec { name: "volume_55", label: "Vol 55", sequence: "MV55" },
    CommandSpec { name: "volume_70", label: "Vol 70", sequence: "MV70" },
    CommandSpec { name: "mute_on", label: "Mute", sequence: "MUON" },
    CommandSpec { name: "mute_off", label: "Unmute", sequence: "MUOFF" },
    // Zone 2 volume
    CommandSpec { name: "zone2_up", label: "Vol +", sequence: "Z2UP\nZ2UP" },
    CommandSpec { name: "zone2_down", label: "Vol -", sequence: "Z2DOWN\nZ2DOWN" },
    CommandSpec {
        name: "zone2_up_5",
        label: "Vol ++",
        sequence: "Z2UP\nZ2UP\nZ2UP\nZ2UP\nZ2UP",
    },
    CommandSpec {
        name: "zone2_down_5",
        label: "Vol --",
        sequence: "Z2DOWN\nZ2DOWN\nZ2DOWN\nZ2DOWN\nZ2DOWN",
    },
    CommandSpec { name: "zone2_40", label: "Vol 40", sequence: "Z240" },
    CommandSpec { name: "zone2_55", label: "Vol 55", sequence: "Z255" },
    CommandSpec { name: "zone2_70", label: "Vol 70", sequence: "Z270" },
    CommandSpec { name: "zone2_mute_on", label: "Mute", sequence: "Z2MUON" },
    CommandSpec { name: "zone2_mute_off", label: "Unmute", sequence: "Z2MUOFF" },
    // Input sources
    CommandSpec { name: "input_cd", label: "CD", sequence: "SICD" },
    CommandSpec { name: "input_dvd", label: "DVD", sequence: "SIDVD" },
    CommandSpec { name: "input_bluray", label: "Blu-ray", sequence: "SIBD" },
    CommandSpec { name: "input_tv", label: "TV", sequence: "SITV" },
    CommandSpec { name: "input_cable", label: "Cable/Sat", sequence: "SICBL/SAT" },
    CommandSpec { name: "input_aux", label: "AUX", sequence: "SIAUX1" },
    CommandSpec { name: "input_bluetooth", label: "Bluetooth", sequence: "SIBT" },
    CommandSpec { name: "input_phono", label: "Phono", sequence: "SIPHONO" },
    CommandSpec { name: "input_tuner", label: "Tuner", sequence: "SITUNER" },
    // Surround modes
    CommandSpec { name: "surround_stereo", label: "Stereo", sequence: "MSSTEREO" },
    CommandSpec { name: "surround_movie", label: "Movie", sequence: "MSMOVIE" },
    CommandSpec { name: "surround_music", label: "Music", sequence: "MSMUSIC" },
    CommandSpec { name: "surround_game", label: "Game", sequence: "MSGAME" },
    CommandSpec { name: "surround_auto", label: "Auto", sequence: "MSAUTO" },
];

/// UI sections in display order.
///
/// Not every table command has a button: `input_phono`, `input_tuner`, and
/// `surround_game` stay API-only.
pub const COMMAND_GROUPS: &[CommandGroup] = &[
    CommandGroup { key: "presets", title: "Presets", commands: &["preset_vinyl"] },
    CommandGroup { key: "power", title: "Power", commands: &["power_on", "power_off"] },
    CommandGroup {
        key: "main_volume",
        title: "Main Volume",
        commands: &[
            "volume_up",
            "volume_up_5",
            "mute_on",
            "volume_down",
            "volume_down_5",
            "mute_off",
        ],
    },
    CommandGroup {
        key: "main_volume_presets",
        title: "Main Volume Presets",
        commands: &["volume_40", "volume_55", "volume_70"],
    },
    CommandGroup {
        key: "zone2_volume",
        title: "Zone 2 Volume",
        commands: &[
            "zone2_up",
            "zone2_up_5",
            "zone2_mute_on",
            "zone2_down",
            "zone2_down_5",
            "zone2_mute_off",
        ],
    },
    CommandGroup {
        key: "zone2_volume_presets",
        title: "Zone 2 Volume Presets",
        commands: &["zone2_40", "zone2_55", "zone2_70"],
    },
    CommandGroup {
        key: "inputs",
        title: "Inputs",
        commands: &[
            "input_cd",
            "input_dvd",
            "input_bluray",
            "input_tv",
            "input_cable",
            "input_aux",
            "input_bluetooth",
        ],
    },
    CommandGroup {
        key: "surround",
        title: "Surround",
        commands: &["surround_stereo", "surround_movie", "surround_music", "surround_auto"],
    },
];

/// Name-indexed view over the static command table.
///
/// Build one at startup and share it behind an `Arc`; lookups are O(1).
#[derive(Debug, Clone)]
pub struct CommandTable {
    index: HashMap<&'static str, &'static CommandSpec>,
}

impl CommandTable {
    /// Builds the standard table from the static command list.
    pub fn standard() -> Self {
        let index = COMMANDS.iter().map(|spec| (spec.name, spec)).collect();
        Self { index }
    }

    /// Looks up a command by its symbolic name.
    pub fn lookup(&self, name: &str) -> Option<&'static CommandSpec> {
        self.index.get(name).copied()
    }

    /// Returns `true` if `name` is a known command.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of commands in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the table holds no commands.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// UI sections in display order.
    pub fn groups(&self) -> &'static [CommandGroup] {
        COMMAND_GROUPS
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
