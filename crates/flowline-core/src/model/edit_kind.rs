//! Edit classification for file-level changes.
//!
//! The wire format carries a legacy bitmask per change; it is decoded exactly
//! once, at the parser boundary, into [`EditKind`]. No raw masks leak past
//! the parser.

use std::fmt;

use serde::{Deserialize, Serialize};

// Wire bitmask values. `MODIFY` frequently rides along with another bit
// (a renamed file whose content also changed is `MODIFY | RENAME`).
const MASK_ADD: u32 = 1;
const MASK_MODIFY: u32 = 2;
const MASK_DELETE: u32 = 4;
const MASK_RENAME: u32 = 8;
const MASK_MOVE: u32 = 16;

/// What happened to one versionable in a change set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Add,
    Edit,
    Delete,
    Rename,
    Move,
}

impl EditKind {
    /// Decode a wire bitmask.
    ///
    /// A lone content-modify bit is an `Edit`. When modify rides along with
    /// exactly one structural bit, the structural bit names the kind (a
    /// renamed-and-edited file is a `Rename`). Every other combination,
    /// including unknown bits, is reported as `Edit` rather than guessed at.
    pub fn from_mask(mask: u32) -> Self {
        let structural = mask & !MASK_MODIFY;
        match structural {
            0 => EditKind::Edit,
            MASK_ADD => EditKind::Add,
            MASK_DELETE => EditKind::Delete,
            MASK_RENAME => EditKind::Rename,
            MASK_MOVE => EditKind::Move,
            _ => EditKind::Edit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::Add => "add",
            EditKind::Edit => "edit",
            EditKind::Delete => "delete",
            EditKind::Rename => "rename",
            EditKind::Move => "move",
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bits_decode_directly() {
        assert_eq!(EditKind::from_mask(1), EditKind::Add);
        assert_eq!(EditKind::from_mask(2), EditKind::Edit);
        assert_eq!(EditKind::from_mask(4), EditKind::Delete);
        assert_eq!(EditKind::from_mask(8), EditKind::Rename);
        assert_eq!(EditKind::from_mask(16), EditKind::Move);
    }

    #[test]
    fn modify_defers_to_the_structural_bit() {
        assert_eq!(EditKind::from_mask(2 | 8), EditKind::Rename);
        assert_eq!(EditKind::from_mask(2 | 16), EditKind::Move);
        assert_eq!(EditKind::from_mask(2 | 1), EditKind::Add);
    }

    #[test]
    fn ambiguous_or_unknown_masks_fall_back_to_edit() {
        // Two structural bits at once.
        assert_eq!(EditKind::from_mask(1 | 4), EditKind::Edit);
        assert_eq!(EditKind::from_mask(8 | 16), EditKind::Edit);
        // Bits the decoder has no name for.
        assert_eq!(EditKind::from_mask(32), EditKind::Edit);
        assert_eq!(EditKind::from_mask(0), EditKind::Edit);
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(EditKind::Rename.to_string(), "rename");
    }
}
