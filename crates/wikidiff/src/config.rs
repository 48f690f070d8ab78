//! Engine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recursion is plain function recursion; cap the configurable depth so a
/// hostile configuration cannot blow the stack.
pub const RECURSION_HARD_MAX: u32 = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("recursion_max must be between 1 and {RECURSION_HARD_MAX}, got {0}")]
    RecursionMaxOutOfRange(u32),
    #[error("unlink_max must be at least 1, got {0}")]
    UnlinkMaxOutOfRange(u32),
    #[error("block_min_length must be at least 1, got {0}")]
    BlockMinLengthOutOfRange(u32),
    #[error("clip window for {axis} has min {min} above max {max}")]
    ClipWindowInverted {
        axis: &'static str,
        min: usize,
        max: usize,
    },
}

/// All engine options. `Default` carries the documented defaults; renderers
/// and callers usually only touch `full_diff`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Emit the complete un-clipped diff text.
    pub full_diff: bool,
    /// Refine unresolved gaps of similar structure down to characters.
    pub char_diff: bool,
    /// Re-run the symbol linker with an empty table to resolve cross-over
    /// duplicates masked by the global table.
    pub repeated_diff: bool,
    /// Recurse into unresolved gaps with local symbol tables.
    pub recursive_diff: bool,
    /// Maximum recursion depth for gap recursion.
    pub recursion_max: u32,
    /// Demote short, non-unique matched blocks back to insertion/deletion
    /// pairs.
    pub unlink_blocks: bool,
    /// Maximum number of unlink cycles.
    pub unlink_max: u32,
    /// Minimum number of real words for a block to count as an anchor.
    pub block_min_length: u32,
    /// Strip one trailing newline from both versions when both end with one.
    pub strip_trailing_newline: bool,
    /// Dump tokens, blocks, groups, and fragments through the `log` facade.
    pub debug: bool,
    /// Log per-stage wall times.
    pub timer: bool,
    /// Rebuild both versions from the fragment stream and flag mismatches.
    pub unit_testing: bool,

    // Clip position search windows, in bytes from the respective side.
    pub clip_heading_left: usize,
    pub clip_paragraph_left_max: usize,
    pub clip_paragraph_left_min: usize,
    pub clip_line_left_max: usize,
    pub clip_line_left_min: usize,
    pub clip_blank_left_max: usize,
    pub clip_blank_left_min: usize,
    pub clip_chars_left: usize,

    pub clip_heading_right: usize,
    pub clip_paragraph_right_max: usize,
    pub clip_paragraph_right_min: usize,
    pub clip_line_right_max: usize,
    pub clip_line_right_min: usize,
    pub clip_blank_right_max: usize,
    pub clip_blank_right_min: usize,
    pub clip_chars_right: usize,

    /// Maximum number of lines to search for a clip position.
    pub clip_lines_left_max: usize,
    pub clip_lines_right_max: usize,

    /// Skip clipping when the kept ranges come too close.
    pub clip_skip_lines: usize,
    pub clip_skip_chars: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            full_diff: false,
            char_diff: true,
            repeated_diff: true,
            recursive_diff: true,
            recursion_max: 10,
            unlink_blocks: true,
            unlink_max: 5,
            block_min_length: 3,
            strip_trailing_newline: true,
            debug: false,
            timer: false,
            unit_testing: false,

            clip_heading_left: 1500,
            clip_paragraph_left_max: 1500,
            clip_paragraph_left_min: 500,
            clip_line_left_max: 1000,
            clip_line_left_min: 500,
            clip_blank_left_max: 1000,
            clip_blank_left_min: 500,
            clip_chars_left: 500,

            clip_heading_right: 1500,
            clip_paragraph_right_max: 1500,
            clip_paragraph_right_min: 500,
            clip_line_right_max: 1000,
            clip_line_right_min: 500,
            clip_blank_right_max: 1000,
            clip_blank_right_min: 500,
            clip_chars_right: 500,

            clip_lines_left_max: 10,
            clip_lines_right_max: 10,

            clip_skip_lines: 5,
            clip_skip_chars: 1000,
        }
    }
}

impl DiffConfig {
    /// Validate option ranges. Called once at engine construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_max == 0 || self.recursion_max > RECURSION_HARD_MAX {
            return Err(ConfigError::RecursionMaxOutOfRange(self.recursion_max));
        }
        if self.unlink_max == 0 {
            return Err(ConfigError::UnlinkMaxOutOfRange(self.unlink_max));
        }
        if self.block_min_length == 0 {
            return Err(ConfigError::BlockMinLengthOutOfRange(self.block_min_length));
        }
        let windows = [
            (
                "paragraph left",
                self.clip_paragraph_left_min,
                self.clip_paragraph_left_max,
            ),
            ("line left", self.clip_line_left_min, self.clip_line_left_max),
            (
                "blank left",
                self.clip_blank_left_min,
                self.clip_blank_left_max,
            ),
            (
                "paragraph right",
                self.clip_paragraph_right_min,
                self.clip_paragraph_right_max,
            ),
            (
                "line right",
                self.clip_line_right_min,
                self.clip_line_right_max,
            ),
            (
                "blank right",
                self.clip_blank_right_min,
                self.clip_blank_right_max,
            ),
        ];
        for (axis, min, max) in windows {
            if min > max {
                return Err(ConfigError::ClipWindowInverted { axis, min, max });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(DiffConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_recursion_is_rejected() {
        let config = DiffConfig {
            recursion_max: 0,
            ..DiffConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::RecursionMaxOutOfRange(0))
        );
    }

    #[test]
    fn inverted_clip_window_is_rejected() {
        let config = DiffConfig {
            clip_line_left_min: 2000,
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ClipWindowInverted { axis: "line left", .. })
        ));
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = DiffConfig {
            full_diff: true,
            recursion_max: 4,
            ..DiffConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DiffConfig = serde_json::from_str(&json).unwrap();
        assert!(back.full_diff);
        assert_eq!(back.recursion_max, 4);
    }
}
