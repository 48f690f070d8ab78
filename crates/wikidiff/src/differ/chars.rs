//! Character-level refinement of unresolved gaps.
//!
//! Only gaps whose tokens are structurally similar are worth splitting into
//! characters: a word that became separated (1 token ↔ 3 tokens), or aligned
//! token pairs that share flanks, contain one another, or agree on at least
//! half of their positions. Identical aligned tokens (spaces, separators)
//! are linked in place so the character split stays confined to words.

use crate::patterns::SplitLevel;

use super::Differ;

/// A maximal unresolved region over both versions.
#[derive(Clone, Debug)]
struct GapRegion {
    new_first: Option<usize>,
    new_last: Option<usize>,
    new_tokens: usize,
    old_first: Option<usize>,
    old_last: Option<usize>,
    old_tokens: usize,
    char_split: Option<bool>,
}

impl Differ {
    pub(super) fn split_refine_chars(&mut self) {
        // Collect gaps along the new text, tracking the old position through
        // the links.
        let mut gaps: Vec<GapRegion> = Vec::new();
        let mut gap: Option<usize> = None;
        let mut i = self.new_text.first;
        let mut j = self.old_text.first;

        while let Some(ni) = i {
            let new_link = self.new_text.tokens[ni].link;
            let old_link = j.and_then(|oj| self.old_text.tokens[oj].link);

            if gap.is_none() && new_link.is_none() && old_link.is_none() {
                gap = Some(gaps.len());
                gaps.push(GapRegion {
                    new_first: Some(ni),
                    new_last: Some(ni),
                    new_tokens: 1,
                    old_first: j,
                    old_last: j,
                    old_tokens: 0,
                    char_split: None,
                });
            } else if let Some(open) = gap {
                if new_link.is_none() {
                    gaps[open].new_last = Some(ni);
                    gaps[open].new_tokens += 1;
                } else {
                    gap = None;
                }
            }

            if let Some(link) = new_link {
                j = self.old_text.tokens[link].next;
            }
            i = self.new_text.tokens[ni].next;
        }

        // Add the old-side extent of each gap.
        for gap in &mut gaps {
            let mut j = gap.old_first;
            while let Some(oj) = j {
                if self.old_text.tokens[oj].link.is_some() {
                    break;
                }
                gap.old_last = Some(oj);
                gap.old_tokens += 1;
                j = self.old_text.tokens[oj].next;
            }
        }

        // Select gaps eligible for character splitting.
        for gap in &mut gaps {
            if gap.new_tokens != gap.old_tokens {
                // Unequal sides: accept only a word that became separated
                // into three tokens (or joined from three).
                let accepted = match (gap.new_tokens, gap.old_tokens) {
                    (1, 3) => {
                        let (Some(whole), Some(first), Some(last)) =
                            (gap.new_first, gap.old_first, gap.old_last)
                        else {
                            continue;
                        };
                        let token = self.new_text.token_text(whole);
                        token.starts_with(self.old_text.token_text(first))
                            && token.ends_with(self.old_text.token_text(last))
                    }
                    (3, 1) => {
                        let (Some(whole), Some(first), Some(last)) =
                            (gap.old_first, gap.new_first, gap.new_last)
                        else {
                            continue;
                        };
                        let token = self.old_text.token_text(whole);
                        token.starts_with(self.new_text.token_text(first))
                            && token.ends_with(self.new_text.token_text(last))
                    }
                    _ => continue,
                };
                if accepted {
                    gap.char_split = Some(true);
                }
                continue;
            }

            // Equal sides: every aligned pair must look like a small edit.
            let mut split = true;
            let mut i = gap.new_first;
            let mut j = gap.old_first;
            while let (Some(ni), Some(oj)) = (i, j) {
                let new_token = self.new_text.token_text(ni);
                let old_token = self.old_text.token_text(oj);
                // The similarity gate works in code points throughout.
                let new_len = new_token.chars().count();
                let old_len = old_token.chars().count();
                let (shorter, longer, shorter_len) = if new_len < old_len {
                    (new_token, old_token, new_len)
                } else {
                    (old_token, new_token, old_len)
                };

                if new_len != old_len {
                    // Identical flank lengths against the shorter token.
                    let left = new_token
                        .chars()
                        .zip(old_token.chars())
                        .take_while(|(a, b)| a == b)
                        .count();
                    let right = new_token
                        .chars()
                        .rev()
                        .zip(old_token.chars().rev())
                        .take_while(|(a, b)| a == b)
                        .count();

                    // Not an insertion or deletion of an internal or
                    // flanking string, and the matching flanks are shorter
                    // than the differing middle: reject the gap.
                    if left + right != shorter_len
                        && !longer.contains(shorter)
                        && left * 2 < shorter_len
                        && right * 2 < shorter_len
                    {
                        split = false;
                        break;
                    }
                } else if new_token != old_token {
                    // Same length: demand at least half identical positions.
                    let identical = shorter
                        .chars()
                        .zip(longer.chars())
                        .filter(|(a, b)| a == b)
                        .count();
                    if shorter_len > 0 && (identical as f64) / (shorter_len as f64) < 0.49 {
                        split = false;
                        break;
                    }
                }

                if i == gap.new_last {
                    break;
                }
                i = self.new_text.tokens[ni].next;
                j = self.old_text.tokens[oj].next;
            }
            gap.char_split = Some(split);
        }

        // Refine the selected gaps.
        for gap in &gaps {
            if gap.char_split != Some(true) {
                continue;
            }
            let aligned = gap.new_tokens == gap.old_tokens;
            let mut i = gap.new_first;
            let mut j = gap.old_first;

            while i.is_some() || j.is_some() {
                // Link aligned identical tokens to keep the character
                // refinement confined to the words around them.
                let identical = match (aligned, i, j) {
                    (true, Some(ni), Some(oj)) => {
                        self.new_text.token_text(ni) == self.old_text.token_text(oj)
                    }
                    _ => false,
                };
                if identical {
                    let (Some(ni), Some(oj)) = (i, j) else { break };
                    self.new_text.tokens[ni].link = Some(oj);
                    self.old_text.tokens[oj].link = Some(ni);
                } else {
                    if let Some(ni) = i {
                        self.new_text.split_text(SplitLevel::Character, Some(ni));
                    }
                    if let Some(oj) = j {
                        self.old_text.split_text(SplitLevel::Character, Some(oj));
                    }
                }

                if i == gap.new_last {
                    i = None;
                }
                if j == gap.old_last {
                    j = None;
                }
                if let Some(ni) = i {
                    i = self.new_text.tokens[ni].next;
                }
                if let Some(oj) = j {
                    j = self.old_text.tokens[oj].next;
                }
            }
        }
    }
}
