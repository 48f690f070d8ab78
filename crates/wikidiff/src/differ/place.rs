//! Placement of deletions, insertions, and move marks into new-text order.
//!
//! Deletions and marks carry no position in the new text; they borrow the
//! `new_number` of a reference block near their original position, preferring
//! fixed neighbors, and are then sorted in around it by old-text number.

use crate::block::{number_or_zero, Block, BlockKind, Group};

use super::Differ;

impl Differ {
    /// Collect unmatched old-text runs as deletion (`-`) blocks.
    pub(super) fn get_del_blocks(&mut self) {
        let mut j = self.old_text.first;
        while j.is_some() {
            let old_start = j;
            let mut count = 0;
            let mut text = String::new();
            while let Some(oj) = j {
                if self.old_text.tokens[oj].link.is_some() {
                    break;
                }
                count += 1;
                text.push_str(self.old_text.token_text(oj));
                j = self.old_text.tokens[oj].next;
            }

            if count != 0 {
                let old_number = old_start
                    .and_then(|s| self.old_text.tokens[s].number)
                    .map(|n| n as i64);
                self.blocks.push(Block {
                    old_block: None,
                    new_block: None,
                    old_number,
                    new_number: None,
                    old_start,
                    count,
                    unique: false,
                    words: 0,
                    chars: text.len(),
                    kind: BlockKind::Deletion,
                    section: None,
                    group: None,
                    fixed: false,
                    moved: None,
                    text,
                });
            }

            // Skip the following matched run.
            if let Some(start) = j {
                let mut i = self.old_text.tokens[start].link;
                let mut oj = Some(start);
                while let (Some(ci), Some(cj)) = (i, oj) {
                    if self.old_text.tokens[cj].link != Some(ci) {
                        break;
                    }
                    i = self.new_text.tokens[ci].next;
                    oj = self.old_text.tokens[cj].next;
                }
                j = oj;
            }
        }
    }

    /// Position deletion blocks into new-text order via a reference block.
    pub(super) fn position_del_blocks(&mut self) {
        // Walk the blocks in old-text order.
        let mut order: Vec<usize> = (0..self.blocks.len()).collect();
        order.sort_by_key(|&b| number_or_zero(self.blocks[b].old_number));

        for position in 0..order.len() {
            let del = order[position];
            if self.blocks[del].kind != BlockKind::Deletion {
                continue;
            }

            let prev = (position > 0).then(|| order[position - 1]);
            let next = (position + 1 < order.len()).then(|| order[position + 1]);

            // Reference block preference:
            // the old-order predecessor if matched and fixed, else the
            // successor if matched and fixed, else the predecessor if
            // matched and not its group's last block, else the successor if
            // matched and not its group's first block, else the nearest
            // earlier matched fixed block.
            let mut reference: Option<usize> = None;
            if let Some(p) = prev {
                if self.blocks[p].kind == BlockKind::Same && self.blocks[p].fixed {
                    reference = Some(p);
                }
            }
            if reference.is_none() {
                if let Some(n) = next {
                    if self.blocks[n].kind == BlockKind::Same && self.blocks[n].fixed {
                        reference = Some(n);
                    }
                }
            }
            if reference.is_none() {
                if let Some(p) = prev {
                    if self.blocks[p].kind == BlockKind::Same
                        && self.blocks[p]
                            .group
                            .is_some_and(|g| self.groups[g].block_end != p)
                    {
                        reference = Some(p);
                    }
                }
            }
            if reference.is_none() {
                if let Some(n) = next {
                    if self.blocks[n].kind == BlockKind::Same
                        && self.blocks[n]
                            .group
                            .is_some_and(|g| self.groups[g].block_start != n)
                    {
                        reference = Some(n);
                    }
                }
            }
            if reference.is_none() {
                for p in (0..=position).rev() {
                    let candidate = order[p];
                    if self.blocks[candidate].kind == BlockKind::Same
                        && self.blocks[candidate].fixed
                    {
                        reference = Some(candidate);
                        break;
                    }
                }
            }

            match reference {
                // No reference: place before everything.
                None => self.blocks[del].new_number = Some(-1),
                Some(r) => {
                    self.blocks[del].new_number = self.blocks[r].new_number;
                    self.blocks[del].section = self.blocks[r].section;
                    self.blocks[del].group = self.blocks[r].group;
                    self.blocks[del].fixed = self.blocks[r].fixed;
                }
            }
        }

        self.sort_blocks();
    }

    /// Collect unmatched new-text runs as insertion (`+`) blocks.
    pub(super) fn get_ins_blocks(&mut self) {
        let mut i = self.new_text.first;
        while let Some(ni) = i {
            if self.new_text.tokens[ni].link.is_some() {
                i = self.new_text.tokens[ni].next;
                continue;
            }

            let i_start = ni;
            let mut count = 0;
            let mut text = String::new();
            let mut cursor = Some(ni);
            while let Some(ci) = cursor {
                if self.new_text.tokens[ci].link.is_some() {
                    break;
                }
                count += 1;
                text.push_str(self.new_text.token_text(ci));
                cursor = self.new_text.tokens[ci].next;
            }

            self.blocks.push(Block {
                old_block: None,
                new_block: None,
                old_number: None,
                new_number: self.new_text.tokens[i_start].number.map(|n| n as i64),
                old_start: None,
                count,
                unique: false,
                words: 0,
                chars: text.len(),
                kind: BlockKind::Insertion,
                section: None,
                group: None,
                fixed: false,
                moved: None,
                text,
            });
            i = cursor;
        }

        self.sort_blocks();
    }

    /// Stable sort by `(new_number, old_number)` with absent numbers as 0,
    /// then re-derive the group block ranges from the new order.
    pub(super) fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|block| {
            (
                number_or_zero(block.new_number),
                number_or_zero(block.old_number),
            )
        });

        let mut current = 0usize;
        for block in 0..self.blocks.len() {
            let Some(group) = self.blocks[block].group else {
                continue;
            };
            if group >= self.groups.len() {
                continue;
            }
            if group != current {
                current = group;
                self.groups[current].block_start = block;
                self.groups[current].old_number = self.blocks[block].old_number;
            }
            self.groups[group].block_end = block;
        }
    }

    /// Attach insertion blocks to the groups whose new-number range they
    /// fall into; leftovers become single-block groups of their own.
    pub(super) fn set_ins_groups(&mut self) {
        for group in 0..self.groups.len() {
            let fixed = self.groups[group].fixed;
            for block in self.groups[group].block_start..=self.groups[group].block_end {
                if self.blocks[block].group.is_none() {
                    self.blocks[block].group = Some(group);
                    self.blocks[block].fixed = fixed;
                }
            }
        }

        for block in 0..self.blocks.len() {
            if self.blocks[block].group.is_some() {
                continue;
            }
            let group = self.groups.len();
            self.blocks[block].group = Some(group);
            self.groups.push(Group {
                old_number: self.blocks[block].old_number,
                block_start: block,
                block_end: block,
                unique: self.blocks[block].unique,
                max_words: self.blocks[block].words,
                words: self.blocks[block].words,
                chars: self.blocks[block].chars,
                fixed: self.blocks[block].fixed,
                moved_from: None,
                color: 0,
            });
        }
    }

    /// Insert a mark (`|`) block at the original position of every moved
    /// group and hand out the move colors.
    pub(super) fn insert_marks(&mut self) {
        let mut color = 1;

        // Walk the blocks in old-text order, ties by new-text order.
        let mut order: Vec<usize> = (0..self.blocks.len()).collect();
        order.sort_by_key(|&b| {
            (
                number_or_zero(self.blocks[b].old_number),
                number_or_zero(self.blocks[b].new_number),
            )
        });
        let mut position_of = vec![0usize; self.blocks.len()];
        for (position, &block) in order.iter().enumerate() {
            position_of[block] = position;
        }

        let group_count = self.groups.len();
        for moved in 0..group_count {
            if self.groups[moved].fixed || self.groups[moved].old_number.is_none() {
                continue;
            }
            let moved_old_number = self.groups[moved].old_number;

            let start_position = position_of[self.groups[moved].block_start];
            let end_position = position_of[self.groups[moved].block_end];
            let prev = (start_position > 0).then(|| order[start_position - 1]);
            let next = (end_position + 1 < order.len()).then(|| order[end_position + 1]);

            // Reference block: old-order predecessor if matched and fixed,
            // else successor if matched and fixed, else the nearest earlier
            // matched fixed block.
            let mut reference: Option<usize> = None;
            if let Some(p) = prev {
                if self.blocks[p].kind == BlockKind::Same && self.blocks[p].fixed {
                    reference = Some(p);
                }
            }
            if reference.is_none() {
                if let Some(n) = next {
                    if self.blocks[n].kind == BlockKind::Same && self.blocks[n].fixed {
                        reference = Some(n);
                    }
                }
            }
            if reference.is_none() {
                for p in (0..start_position).rev() {
                    let candidate = order[p];
                    if self.blocks[candidate].kind == BlockKind::Same
                        && self.blocks[candidate].fixed
                    {
                        reference = Some(candidate);
                        break;
                    }
                }
            }

            let (new_number, mark_group) = match reference {
                // Moved from before the first fixed block: the mark sorts
                // before everything in a fresh single-mark group.
                None => {
                    let group = self.groups.len();
                    self.groups.push(Group {
                        old_number: None,
                        block_start: self.blocks.len(),
                        block_end: self.blocks.len(),
                        unique: false,
                        max_words: 0,
                        words: 0,
                        chars: 0,
                        fixed: false,
                        moved_from: None,
                        color: 0,
                    });
                    (Some(-1), group)
                }
                Some(r) => {
                    let Some(group) = self.blocks[r].group else {
                        continue;
                    };
                    (self.blocks[r].new_number, group)
                }
            };

            self.blocks.push(Block {
                old_block: None,
                new_block: None,
                old_number: moved_old_number,
                new_number,
                old_start: None,
                count: 0,
                unique: false,
                words: 0,
                chars: 0,
                kind: BlockKind::Mark,
                section: None,
                group: Some(mark_group),
                fixed: true,
                moved: Some(moved),
                text: String::new(),
            });

            self.groups[moved].color = color;
            self.groups[moved].moved_from = Some(mark_group);
            color += 1;
        }

        self.sort_blocks();
    }
}
