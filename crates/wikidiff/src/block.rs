//! Block, section, and group tables built during move detection.
//!
//! Blocks are maximal token runs of one kind in new-text order. Sections are
//! scopes that contain all move crossings of their blocks. Groups are runs of
//! matched blocks that are consecutive in old-text order; "moved" status
//! applies to whole groups.

/// Block kind in the assembled table. `Mark` is the original-position
/// indicator of a moved group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Same,
    Deletion,
    Insertion,
    Mark,
}

#[derive(Clone, Debug)]
pub(crate) struct Block {
    /// Index among matched blocks in old-text order.
    pub old_block: Option<usize>,
    /// Index among matched blocks in new-text order.
    pub new_block: Option<usize>,
    /// Token number of the first token in the old text. `-1` sorts a block
    /// before everything.
    pub old_number: Option<i64>,
    /// Token number of the first token in the new text.
    pub new_number: Option<i64>,
    /// Arena index of the first old-text token, for unlinking.
    pub old_start: Option<usize>,
    /// Number of tokens in the block.
    pub count: usize,
    /// Block contains a unique anchor token.
    pub unique: bool,
    /// Real word count of the block text.
    pub words: u32,
    /// Byte length of the block text.
    pub chars: usize,
    pub kind: BlockKind,
    pub section: Option<usize>,
    pub group: Option<usize>,
    /// Block belongs to a group that did not move.
    pub fixed: bool,
    /// For a mark block: index of the moved group it points at.
    pub moved: Option<usize>,
    pub text: String,
}

/// A maximal block range whose move crossings stay inside the range.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Section {
    pub block_start: usize,
    pub block_end: usize,
}

/// A run of matched blocks consecutive in old-text order.
#[derive(Clone, Debug)]
pub(crate) struct Group {
    /// `old_number` of the first block.
    pub old_number: Option<i64>,
    pub block_start: usize,
    pub block_end: usize,
    /// Group contains a unique anchor token.
    pub unique: bool,
    /// Word count of the longest member block.
    pub max_words: u32,
    /// Total word count.
    pub words: u32,
    /// Total byte length.
    pub chars: usize,
    /// Group did not move from its original position.
    pub fixed: bool,
    /// For a moved group: index of the group holding its mark block.
    pub moved_from: Option<usize>,
    /// Color number of a moved group, 0 for unmoved.
    pub color: u32,
}

/// Sort key treating an absent number as 0, so positioned blocks with the
/// `-1` sentinel land before everything.
pub(crate) fn number_or_zero(number: Option<i64>) -> i64 {
    number.unwrap_or(0)
}
