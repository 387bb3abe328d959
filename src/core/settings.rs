use serde::{Deserialize, Serialize};

/// Settings for how to run the emulator.
///
/// None of these change the emulated hardware, they only control debugging output
/// and which background layers are drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How many previously executed instructions to keep for the crash dump.
    pub history_len: usize,
    /// Log every instruction executed at the `trace` level.
    pub trace_instructions: bool,
    /// ANDed with the main screen layer enable register, bit 0 is BG1.
    /// Used to hide layers while debugging.
    pub layer_mask: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            history_len: 200,
            trace_instructions: false,
            layer_mask: 0xFF,
        }
    }
}
