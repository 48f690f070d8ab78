//! Block, section, and group detection over the linked token lists, the
//! fixed-path choice, and the weak-block unlinker.

use rustc_hash::FxHashMap;

use crate::block::{number_or_zero, Block, BlockKind, Group, Section};

use super::{word_count, Differ};

#[derive(Clone, Debug)]
struct PathEntry {
    path: Vec<usize>,
    chars: usize,
}

impl Differ {
    /// Collect matched (`=`) blocks from the old text: maximal runs whose
    /// links chain consecutively in the new text. The result is sorted into
    /// new-text order and numbered.
    pub(super) fn get_same_blocks(&mut self) {
        self.blocks.clear();

        let mut j = self.old_text.first;
        loop {
            // Skip unmatched old tokens.
            while let Some(oj) = j {
                if self.old_text.tokens[oj].link.is_some() {
                    break;
                }
                j = self.old_text.tokens[oj].next;
            }
            let Some(j_start) = j else { break };
            let Some(i_start) = self.old_text.tokens[j_start].link else {
                break;
            };

            // Walk the consecutive linked run.
            let mut i = Some(i_start);
            let mut count = 0;
            let mut unique = false;
            let mut text = String::new();
            while let (Some(ni), Some(oj)) = (i, j) {
                if self.old_text.tokens[oj].link != Some(ni) {
                    break;
                }
                text.push_str(self.old_text.token_text(oj));
                count += 1;
                if self.new_text.tokens[ni].unique {
                    unique = true;
                }
                i = self.new_text.tokens[ni].next;
                j = self.old_text.tokens[oj].next;
            }

            let words = word_count(&text);
            self.blocks.push(Block {
                old_block: Some(self.blocks.len()),
                new_block: None,
                old_number: self.old_text.tokens[j_start].number.map(|n| n as i64),
                new_number: self.new_text.tokens[i_start].number.map(|n| n as i64),
                old_start: Some(j_start),
                count,
                unique,
                words,
                chars: text.len(),
                kind: BlockKind::Same,
                section: None,
                group: None,
                fixed: false,
                moved: None,
                text,
            });
        }

        self.blocks
            .sort_by_key(|block| number_or_zero(block.new_number));
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.new_block = Some(index);
        }
    }

    /// Collect sections: maximal block ranges whose move crossings (a later
    /// block's old number dipping below the running maximum) stay inside the
    /// range.
    pub(super) fn get_sections(&mut self) {
        self.sections.clear();

        let mut block = 0;
        while block < self.blocks.len() {
            let section_start = block;
            let mut section_end = block;

            let mut old_max = number_or_zero(self.blocks[section_start].old_number);
            let mut section_old_max = old_max;

            for j in section_start + 1..self.blocks.len() {
                let old_number = number_or_zero(self.blocks[j].old_number);
                if old_number > old_max {
                    old_max = old_number;
                } else if old_number < section_old_max {
                    section_end = j;
                    section_old_max = old_max;
                }
            }

            if section_end > section_start {
                let section = self.sections.len();
                for b in section_start..=section_end {
                    self.blocks[b].section = Some(section);
                }
                self.sections.push(Section {
                    block_start: section_start,
                    block_end: section_end,
                });
                block = section_end;
                continue;
            }

            block += 1;
        }
    }

    /// Collect groups: maximal block runs whose `old_block` increments by
    /// exactly one. Groups outside any section cannot have moved.
    pub(super) fn get_groups(&mut self) {
        self.groups.clear();

        let mut block = 0;
        while block < self.blocks.len() {
            let group_start = block;
            let mut group_end = block;
            let mut old_block = self.blocks[group_start].old_block;

            let mut words = self.blocks[block].words;
            let mut max_words = words;
            let mut unique = self.blocks[block].unique;
            let mut chars = self.blocks[block].chars;

            for i in group_end + 1..self.blocks.len() {
                if self.blocks[i].old_block != old_block.map(|b| b + 1) {
                    break;
                }
                old_block = self.blocks[i].old_block;

                if self.blocks[i].words > max_words {
                    max_words = self.blocks[i].words;
                }
                if self.blocks[i].unique {
                    unique = true;
                }
                words += self.blocks[i].words;
                chars += self.blocks[i].chars;
                group_end = i;
            }

            let fixed = self.blocks[group_start].section.is_none();
            let group = self.groups.len();
            for i in group_start..=group_end {
                self.blocks[i].group = Some(group);
                self.blocks[i].fixed = fixed;
            }
            self.groups.push(Group {
                old_number: self.blocks[group_start].old_number,
                block_start: group_start,
                block_end: group_end,
                unique,
                max_words,
                words,
                chars,
                fixed,
                moved_from: None,
                color: 0,
            });

            if max_words > self.max_words {
                self.max_words = max_words;
            }
            block = group_end + 1;
        }
    }

    /// Per section, mark the monotonically increasing chain of groups with
    /// the largest total byte length as fixed; everything else in the
    /// section is a move candidate.
    pub(super) fn set_fixed(&mut self) {
        for s in 0..self.sections.len() {
            let section = self.sections[s];
            let (Some(group_start), Some(group_end)) = (
                self.blocks[section.block_start].group,
                self.blocks[section.block_end].group,
            ) else {
                continue;
            };

            let path = self.longest_increasing_path(group_start, group_end);
            for group in path {
                self.groups[group].fixed = true;
                for block in self.groups[group].block_start..=self.groups[group].block_end {
                    self.blocks[block].fixed = true;
                }
            }
        }
    }

    /// Find the chain of groups within `[group_start, group_end]` that is
    /// monotonically non-decreasing in old number and maximal in byte
    /// length. Entries are filled back to front, so every later start is
    /// already solved when a start is processed.
    fn longest_increasing_path(&self, group_start: usize, group_end: usize) -> Vec<usize> {
        let mut cache: FxHashMap<usize, PathEntry> = FxHashMap::default();

        for start in (group_start..=group_end).rev() {
            let old_number = number_or_zero(self.groups[start].old_number);
            let mut best_path: Vec<usize> = Vec::new();
            let mut best_chars = 0;

            for i in start + 1..=group_end {
                if number_or_zero(self.groups[i].old_number) < old_number {
                    continue;
                }
                if let Some(entry) = cache.get(&i) {
                    if entry.chars > best_chars {
                        best_chars = entry.chars;
                        best_path = entry.path.clone();
                    }
                }
            }

            best_path.insert(0, start);
            cache.insert(
                start,
                PathEntry {
                    path: best_path,
                    chars: best_chars + self.groups[start].chars,
                },
            );
        }

        let mut max_chars = 0;
        let mut max_path = Vec::new();
        for start in group_start..=group_end {
            if let Some(entry) = cache.get(&start) {
                if entry.chars > max_chars {
                    max_chars = entry.chars;
                    max_path = entry.path.clone();
                }
            }
        }
        max_path
    }

    /// Demote weak matched blocks back into insertion/deletion pairs: whole
    /// groups without a long or unique block, and single-word flanks of the
    /// surviving groups. Returns whether anything was unlinked.
    pub(super) fn unlink_blocks(&mut self) -> bool {
        let mut unlinked = false;

        for group in 0..self.groups.len() {
            let mut block_start = self.groups[group].block_start;
            let block_end = self.groups[group].block_end;

            if self.groups[group].max_words < self.config.block_min_length
                && !self.groups[group].unique
            {
                // Unlink the whole group.
                for block in block_start..=block_end {
                    if self.blocks[block].kind == BlockKind::Same {
                        self.unlink_single_block(block);
                        unlinked = true;
                    }
                }
            } else {
                // Unlink single-word flanks from the start...
                for block in block_start..=block_end {
                    if self.blocks[block].kind == BlockKind::Same {
                        if self.blocks[block].words > 1 || self.blocks[block].unique {
                            break;
                        }
                        self.unlink_single_block(block);
                        unlinked = true;
                        block_start = block;
                    }
                }
                // ...and from the end.
                for block in (block_start + 1..=block_end).rev() {
                    if self.blocks[block].kind == BlockKind::Same {
                        if self.blocks[block].words > 1
                            || (self.blocks[block].words == 1 && self.blocks[block].unique)
                        {
                            break;
                        }
                        self.unlink_single_block(block);
                        unlinked = true;
                    }
                }
            }
        }

        unlinked
    }

    /// Clear the links of every token of one matched block, on both sides.
    fn unlink_single_block(&mut self, block: usize) {
        let mut j = self.blocks[block].old_start;
        for _ in 0..self.blocks[block].count {
            let Some(oj) = j else { break };
            if let Some(link) = self.old_text.tokens[oj].link.take() {
                self.new_text.tokens[link].link = None;
            }
            j = self.old_text.tokens[oj].next;
        }
    }
}
