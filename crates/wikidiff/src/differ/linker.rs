//! Symbol-table token linking.
//!
//! A Heckel-style matcher: tokens occurring exactly once in each version are
//! linked as anchors, then matches expand from those anchors in both
//! directions. The whole procedure repeats once with an empty table to catch
//! duplicates masked by cross-overs, and recurses into still-unresolved gaps
//! with gap-local tables.

use std::mem;

use rustc_hash::FxHashMap;

use crate::patterns::{SplitLevel, COUNT_CHUNKS, COUNT_WORDS, NON_BLANK};

use super::Differ;

/// One symbol table entry: occurrence counts and last-seen token indices for
/// a token text.
#[derive(Clone, Debug)]
pub(crate) struct Symbol {
    pub new_count: u32,
    pub old_count: u32,
    pub new_token: Option<usize>,
    pub old_token: Option<usize>,
}

/// Symbol table over unmatched tokens of both versions.
#[derive(Debug, Default)]
pub(crate) struct Symbols {
    pub entries: Vec<Symbol>,
    pub hash: FxHashMap<String, usize>,
    /// At least one anchor pair has been linked through this table.
    pub linked: bool,
}

impl Differ {
    /// Link corresponding tokens of the old and new version. Called once per
    /// refinement level, and recursively/repeatedly for unresolved regions.
    ///
    /// Passes:
    /// 1. scan unmatched new tokens into the symbol table
    /// 2. scan unmatched old tokens likewise
    /// 3. link tokens occurring exactly once in both versions
    /// 4. expand links downwards along adjacent equal tokens
    /// 5. expand links upwards
    ///
    /// The level-0 non-repeating invocation uses the engine's persistent
    /// table and border lists; repeated and recursive invocations get fresh
    /// local ones and merge their resulting borders back.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn calculate_diff(
        &mut self,
        level: SplitLevel,
        recurse: bool,
        repeating: bool,
        new_start: Option<usize>,
        old_start: Option<usize>,
        up: bool,
        recursion_level: u32,
    ) {
        let new_start = new_start.or(self.new_text.first);
        let old_start = old_start.or(self.old_text.first);

        let global = recursion_level == 0 && !repeating;
        let (mut symbols, mut borders_down, mut borders_up) = if global {
            (
                mem::take(&mut self.symbols),
                mem::take(&mut self.borders_down),
                mem::take(&mut self.borders_up),
            )
        } else {
            (Symbols::default(), Vec::new(), Vec::new())
        };
        let mut borders_down_next: Vec<(usize, usize)> = Vec::new();
        let mut borders_up_next: Vec<(usize, usize)> = Vec::new();

        // Pass 1: scan unmatched new text tokens into the symbol table.
        let mut i = new_start;
        while let Some(index) = i {
            if self.new_text.tokens[index].link.is_none() {
                let token = self.new_text.token_text(index);
                match symbols.hash.get(token).copied() {
                    None => {
                        symbols.hash.insert(token.to_string(), symbols.entries.len());
                        symbols.entries.push(Symbol {
                            new_count: 1,
                            old_count: 0,
                            new_token: Some(index),
                            old_token: None,
                        });
                    }
                    Some(entry) => {
                        symbols.entries[entry].new_count += 1;
                    }
                }
            } else if recursion_level > 0 {
                // A recursive call scans its gap only.
                break;
            }
            i = if up {
                self.new_text.tokens[index].prev
            } else {
                self.new_text.tokens[index].next
            };
        }

        // Pass 2: scan unmatched old text tokens into the symbol table.
        let mut j = old_start;
        while let Some(index) = j {
            if self.old_text.tokens[index].link.is_none() {
                let token = self.old_text.token_text(index);
                match symbols.hash.get(token).copied() {
                    None => {
                        symbols.hash.insert(token.to_string(), symbols.entries.len());
                        symbols.entries.push(Symbol {
                            new_count: 0,
                            old_count: 1,
                            new_token: None,
                            old_token: Some(index),
                        });
                    }
                    Some(entry) => {
                        symbols.entries[entry].old_count += 1;
                        symbols.entries[entry].old_token = Some(index);
                    }
                }
            } else if recursion_level > 0 {
                break;
            }
            j = if up {
                self.old_text.tokens[index].prev
            } else {
                self.old_text.tokens[index].next
            };
        }

        // Pass 3: link tokens unique to both versions.
        for entry in 0..symbols.entries.len() {
            let symbol = &symbols.entries[entry];
            if symbol.new_count != 1 || symbol.old_count != 1 {
                continue;
            }
            let (Some(new_token), Some(old_token)) = (symbol.new_token, symbol.old_token) else {
                continue;
            };
            if self.new_text.tokens[new_token].link.is_some() {
                continue;
            }
            // Blank-only tokens make no anchors.
            if !NON_BLANK.is_match(self.new_text.token_text(new_token)) {
                continue;
            }

            self.new_text.tokens[new_token].link = Some(old_token);
            self.old_text.tokens[old_token].link = Some(new_token);
            symbols.linked = true;

            borders_down.push((new_token, old_token));
            borders_up.push((new_token, old_token));

            // Grade the anchor at the full-text level only.
            if recursion_level == 0 {
                let unique = level == SplitLevel::Character || self.token_is_unique(new_token);
                if unique {
                    self.new_text.tokens[new_token].unique = true;
                    self.old_text.tokens[old_token].unique = true;
                }
            }
        }

        let linked = symbols.linked;
        if global {
            self.symbols = symbols;
        }

        // Continue only if anchors exist; an anchorless invocation leaves
        // the carried borders untouched for the next level.
        if !linked {
            if global {
                self.borders_down = borders_down;
                self.borders_up = borders_up;
            }
            return;
        }

        // Pass 4: expand links downwards from every border.
        for &(border_new, border_old) in &borders_down {
            let mut i_match = border_new;
            let mut j_match = border_old;
            let mut i = self.new_text.tokens[border_new].next;
            let mut j = self.old_text.tokens[border_old].next;

            while let (Some(ni), Some(oj)) = (i, j) {
                if self.new_text.tokens[ni].link.is_some() || self.old_text.tokens[oj].link.is_some()
                {
                    break;
                }
                if self.new_text.token_text(ni) != self.old_text.token_text(oj) {
                    // Not a match yet, maybe in the next refinement level.
                    borders_down_next.push((i_match, j_match));
                    break;
                }
                self.new_text.tokens[ni].link = Some(oj);
                self.old_text.tokens[oj].link = Some(ni);

                i_match = ni;
                j_match = oj;
                i = self.new_text.tokens[ni].next;
                j = self.old_text.tokens[oj].next;
            }
        }

        // Pass 5: expand links upwards from every border.
        for &(border_new, border_old) in &borders_up {
            let mut i_match = border_new;
            let mut j_match = border_old;
            let mut i = self.new_text.tokens[border_new].prev;
            let mut j = self.old_text.tokens[border_old].prev;

            while let (Some(ni), Some(oj)) = (i, j) {
                if self.new_text.tokens[ni].link.is_some() || self.old_text.tokens[oj].link.is_some()
                {
                    break;
                }
                if self.new_text.token_text(ni) != self.old_text.token_text(oj) {
                    borders_up_next.push((i_match, j_match));
                    break;
                }
                self.new_text.tokens[ni].link = Some(oj);
                self.old_text.tokens[oj].link = Some(ni);

                i_match = ni;
                j_match = oj;
                i = self.new_text.tokens[ni].prev;
                j = self.old_text.tokens[oj].prev;
            }
        }

        // At the full-text level, extend matches from both arena boundaries:
        // the boundary counts as a virtual match.
        if global {
            let mut i = self.new_text.first;
            let mut j = self.old_text.first;
            let mut matched = None;
            while let (Some(ni), Some(oj)) = (i, j) {
                if self.new_text.tokens[ni].link.is_some()
                    || self.old_text.tokens[oj].link.is_some()
                    || self.new_text.token_text(ni) != self.old_text.token_text(oj)
                {
                    break;
                }
                self.new_text.tokens[ni].link = Some(oj);
                self.old_text.tokens[oj].link = Some(ni);
                matched = Some((ni, oj));
                i = self.new_text.tokens[ni].next;
                j = self.old_text.tokens[oj].next;
            }
            if let Some(border) = matched {
                borders_down_next.push(border);
            }

            let mut i = self.new_text.last;
            let mut j = self.old_text.last;
            let mut matched = None;
            while let (Some(ni), Some(oj)) = (i, j) {
                if self.new_text.tokens[ni].link.is_some()
                    || self.old_text.tokens[oj].link.is_some()
                    || self.new_text.token_text(ni) != self.old_text.token_text(oj)
                {
                    break;
                }
                self.new_text.tokens[ni].link = Some(oj);
                self.old_text.tokens[oj].link = Some(ni);
                matched = Some((ni, oj));
                i = self.new_text.tokens[ni].prev;
                j = self.old_text.tokens[oj].prev;
            }
            if let Some(border) = matched {
                borders_up_next.push(border);
            }
        }

        // Hand the updated borders back before repeating or recursing so the
        // nested calls merge into the fresh lists.
        if global {
            self.borders_down = borders_down_next.clone();
            self.borders_up = borders_up_next.clone();
        } else {
            self.borders_down.extend_from_slice(&borders_down_next);
            self.borders_up.extend_from_slice(&borders_up_next);
        }

        // Repeat once with an empty symbol table to link common tokens
        // hidden by cross-overs.
        if !repeating && self.config.repeated_diff {
            self.calculate_diff(level, recurse, true, new_start, old_start, up, recursion_level);
        }

        // Recurse into unresolved regions with fresh local tables.
        if recurse && self.config.recursive_diff && recursion_level < self.config.recursion_max {
            for &(border_new, border_old) in &borders_down_next {
                let i = self.new_text.tokens[border_new].next;
                let j = self.old_text.tokens[border_old].next;
                if let (Some(ni), Some(oj)) = (i, j) {
                    if self.new_text.tokens[ni].link.is_none()
                        && self.old_text.tokens[oj].link.is_none()
                    {
                        self.calculate_diff(
                            level,
                            recurse,
                            false,
                            Some(ni),
                            Some(oj),
                            false,
                            recursion_level + 1,
                        );
                    }
                }
            }

            for &(border_new, border_old) in &borders_up_next {
                let i = self.new_text.tokens[border_new].prev;
                let j = self.old_text.tokens[border_old].prev;
                if let (Some(ni), Some(oj)) = (i, j) {
                    if self.new_text.tokens[ni].link.is_none()
                        && self.old_text.tokens[oj].link.is_none()
                    {
                        self.calculate_diff(
                            level,
                            recurse,
                            false,
                            Some(ni),
                            Some(oj),
                            true,
                            recursion_level + 1,
                        );
                    }
                }
            }
        }
    }

    /// An anchor is unique when its token holds at least `block_min_length`
    /// real words or chunks, or contains a word occurring exactly once in
    /// each version.
    fn token_is_unique(&self, new_token: usize) -> bool {
        let text = self.new_text.token_text(new_token);
        let words: Vec<&str> = COUNT_WORDS
            .find_iter(text)
            .chain(COUNT_CHUNKS.find_iter(text))
            .map(|m| m.as_str())
            .collect();

        if words.len() >= self.config.block_min_length as usize {
            return true;
        }
        words.iter().any(|word| {
            self.old_text.word_occurrences(word) == 1 && self.new_text.word_occurrences(word) == 1
        })
    }
}
