//! Knobs for kern feature writing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_VALUE: u32 = 3;
/// 2^14, well below the 16 bit offset limit of a subtable.
pub const DEFAULT_SUBTABLE_SIZE: usize = 1 << 14;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KernOptions {
    /// Static values whose magnitude is below this are trimmed (inclusive threshold)
    pub min_value: u32,
    /// Split glyph/group and group/group kerning into size-bounded subtables
    pub write_subtables: bool,
    /// Estimated byte ceiling of one subtable
    pub subtable_size: usize,
    /// Write trimmed pairs as comments instead of dropping them
    pub write_trimmed_pairs: bool,
    /// Replace kerning groups holding a single glyph by that glyph
    pub dissolve_single: bool,
    /// Pairs with an operand ending in this are ignored
    pub ignore_suffix: Option<String>,
    /// Add a creation time to the header
    pub write_timestamp: bool,
}

impl Default for KernOptions {
    fn default() -> Self {
        KernOptions {
            min_value: DEFAULT_MIN_VALUE,
            write_subtables: false,
            subtable_size: DEFAULT_SUBTABLE_SIZE,
            write_trimmed_pairs: false,
            dissolve_single: false,
            ignore_suffix: None,
            write_timestamp: false,
        }
    }
}
