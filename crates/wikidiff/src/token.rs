//! Token arena for one text version.
//!
//! Tokens live in a growable arena and form a doubly linked list through
//! `prev`/`next` indices. Refinement only ever *adds* tokens: splitting a
//! token appends its pieces to the arena and splices them into the list in
//! place of the original, which stays behind as an orphan. A token's text is
//! a byte range into the version text, so no split allocates.

use rustc_hash::FxHashMap;

use crate::patterns::{self, SplitLevel, COUNT_CHUNKS, COUNT_WORDS};

/// One token of a version text.
#[derive(Clone, Debug)]
pub(crate) struct Token {
    /// Byte range of the token text within the owning version's text.
    pub start: usize,
    pub end: usize,
    /// Neighbors in the live token list.
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Index of the corresponding token in the other version's arena.
    pub link: Option<usize>,
    /// Enumeration index in list order, assigned once after refinement ends.
    pub number: Option<usize>,
    /// Token anchors a real (long or unique-word) match.
    pub unique: bool,
}

/// One version (old or new) of the compared text: the text itself, its token
/// arena, and the word/chunk occurrence index used by the uniqueness test.
#[derive(Debug, Default)]
pub(crate) struct VersionText {
    pub text: String,
    pub tokens: Vec<Token>,
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub words: FxHashMap<String, u32>,
}

impl VersionText {
    pub fn new(text: &str) -> Self {
        let mut version = VersionText {
            text: text.to_string(),
            tokens: Vec::new(),
            first: None,
            last: None,
            words: FxHashMap::default(),
        };
        // Count occurrences under both the word and the chunk pattern; a
        // token text seen by both patterns contributes under both.
        version.word_parse(&COUNT_WORDS);
        version.word_parse(&COUNT_CHUNKS);
        version
    }

    fn word_parse(&mut self, pattern: &regex::Regex) {
        for m in pattern.find_iter(&self.text) {
            *self.words.entry(m.as_str().to_string()).or_insert(0) += 1;
        }
    }

    /// Occurrence count of `word`; unseen words count as zero.
    pub fn word_occurrences(&self, word: &str) -> u32 {
        self.words.get(word).copied().unwrap_or(0)
    }

    pub fn token_text(&self, index: usize) -> &str {
        let token = &self.tokens[index];
        &self.text[token.start..token.end]
    }

    /// Split the whole text (`token == None`) or a single existing token
    /// into tokens at `level`. New tokens are appended to the arena and
    /// stitched into the list between the split token's former neighbors;
    /// `first`/`last` move if the split touched either end of the list.
    pub fn split_text(&mut self, level: SplitLevel, token: Option<usize>) {
        let arena_start = self.tokens.len();

        let (mut prev, next, range) = match token {
            None => (None, None, (0, self.text.len())),
            Some(index) => {
                let t = &self.tokens[index];
                (t.prev, t.next, (t.start, t.end))
            }
        };

        let segments = patterns::segment_ranges(level, &self.text[range.0..range.1]);

        let mut current = arena_start;
        let mut count = 0;
        for (seg_start, seg_end) in segments {
            self.tokens.push(Token {
                start: range.0 + seg_start,
                end: range.0 + seg_end,
                prev,
                next: None,
                link: None,
                number: None,
                unique: false,
            });
            count += 1;

            if let Some(prev) = prev {
                self.tokens[prev].next = Some(current);
            }
            prev = Some(current);
            current += 1;
        }

        // Connect the last new token to the split token's old successor.
        if count > 0 && token.is_some() {
            if let Some(prev) = prev {
                self.tokens[prev].next = next;
            }
            if let Some(next) = next {
                self.tokens[next].prev = prev;
            }
        }

        if count > 0 {
            match token {
                None => {
                    self.first = Some(arena_start);
                    self.last = prev;
                }
                Some(index) => {
                    if self.first == Some(index) {
                        self.first = Some(arena_start);
                    }
                    if self.last == Some(index) {
                        self.last = prev;
                    }
                }
            }
        }
    }

    /// Split every unmatched token of the list into smaller tokens at
    /// `level`. The walk continues from each split token's stored successor,
    /// which skips the freshly inserted refinements.
    pub fn split_refine(&mut self, level: SplitLevel) {
        let mut cursor = self.first;
        while let Some(i) = cursor {
            if self.tokens[i].link.is_none() {
                self.split_text(level, Some(i));
            }
            cursor = self.tokens[i].next;
        }
    }

    /// Number the live tokens in list order.
    pub fn enumerate_tokens(&mut self) {
        let mut number = 0;
        let mut cursor = self.first;
        while let Some(i) = cursor {
            self.tokens[i].number = Some(number);
            number += 1;
            cursor = self.tokens[i].next;
        }
    }

    /// Walk the live list front to back.
    pub fn iter_live(&self) -> LiveTokens<'_> {
        LiveTokens {
            version: self,
            cursor: self.first,
        }
    }

    /// Check `prev`/`next` symmetry over the live list. Debug builds assert
    /// on this after every refinement stage.
    pub fn check_list_integrity(&self) -> bool {
        let mut prev = None;
        let mut cursor = self.first;
        while let Some(i) = cursor {
            if self.tokens[i].prev != prev {
                return false;
            }
            prev = cursor;
            cursor = self.tokens[i].next;
        }
        prev == self.last || (self.first.is_none() && self.last.is_none())
    }
}

pub(crate) struct LiveTokens<'a> {
    version: &'a VersionText,
    cursor: Option<usize>,
}

impl<'a> Iterator for LiveTokens<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.cursor?;
        self.cursor = self.version.tokens[index].next;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_texts(version: &VersionText) -> Vec<&str> {
        version.iter_live().map(|i| version.token_text(i)).collect()
    }

    #[test]
    fn initial_split_builds_list() {
        let mut version = VersionText::new("one\n\ntwo");
        version.split_text(SplitLevel::Paragraph, None);
        assert_eq!(live_texts(&version), vec!["one", "\n\n", "two"]);
        assert!(version.check_list_integrity());
    }

    #[test]
    fn empty_text_stays_empty() {
        let mut version = VersionText::new("");
        version.split_text(SplitLevel::Paragraph, None);
        assert_eq!(version.first, None);
        assert_eq!(version.last, None);
    }

    #[test]
    fn refining_a_middle_token_splices_in_place() {
        let mut version = VersionText::new("a b\nc d");
        version.split_text(SplitLevel::Line, None);
        assert_eq!(live_texts(&version), vec!["a b", "\n", "c d"]);

        // Mark the newline as matched so refinement skips it.
        let newline = version.iter_live().nth(1).unwrap();
        version.tokens[newline].link = Some(0);
        version.split_refine(SplitLevel::Word);
        assert_eq!(live_texts(&version), vec!["a", " ", "b", "\n", "c", " ", "d"]);
        assert!(version.check_list_integrity());
    }

    #[test]
    fn refining_moves_first_and_last() {
        let mut version = VersionText::new("aa bb");
        version.split_text(SplitLevel::Paragraph, None);
        version.split_refine(SplitLevel::Word);
        assert_eq!(live_texts(&version), vec!["aa", " ", "bb"]);
        assert_eq!(version.token_text(version.first.unwrap()), "aa");
        assert_eq!(version.token_text(version.last.unwrap()), "bb");
    }

    #[test]
    fn enumeration_numbers_live_tokens_in_order() {
        let mut version = VersionText::new("x y");
        version.split_text(SplitLevel::Paragraph, None);
        version.split_refine(SplitLevel::Word);
        version.enumerate_tokens();
        let numbers: Vec<usize> = version
            .iter_live()
            .map(|i| version.tokens[i].number.unwrap())
            .collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn word_index_counts_words_and_chunks() {
        let version = VersionText::new("alpha alpha [[alpha]]");
        assert_eq!(version.word_occurrences("alpha"), 3);
        assert_eq!(version.word_occurrences("[[alpha]]"), 1);
        assert_eq!(version.word_occurrences("missing"), 0);
    }
}
