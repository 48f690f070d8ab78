//! Compiled patterns for text splitting, word counting, gap sliding, and
//! clipping.
//!
//! The split levels form a strict hierarchy: paragraph → line → sentence →
//! chunk → word → character. Each level's pattern matches the *separators*
//! (or atoms) of that level; the tokenizer turns both the matches and the
//! unmatched stretches between them into tokens. The chunk and word levels
//! know about wiki markup (`[[…]]`, `{{…}}`, `'''`, `==`, table syntax, bare
//! URLs) so that markup atoms survive as single tokens.

use lazy_static::lazy_static;
use regex::Regex;

/// Line terminators beyond `\n` and `\r` (NEL, LINE SEPARATOR).
const NEWLINES_EXTRA: &str = "\\u{0085}\\u{2028}";

/// All line terminator characters.
const NEWLINES_ALL: &str = "\\n\\r\\u{0085}\\u{2028}";

/// New-paragraph characters (FORM FEED, PARAGRAPH SEPARATOR).
const NEW_PARAGRAPH: &str = "\\x0C\\u{2029}";

/// Breaking whitespace, excluding line terminators and form feed.
const BLANKS: &str = " \\t\\x0B\\u{2000}-\\u{200B}\\u{202F}\\u{205F}\\u{3000}";

/// Full stop characters beyond `.` (Armenian, Arabic, Devanagari, CJK, …).
const FULL_STOPS: &str = "\\u{0589}\\u{06D4}\\u{0701}\\u{0702}\\u{0964}\\u{0DF4}\\u{1362}\\u{166E}\\u{1803}\\u{1809}\
                          \\u{2CF9}\\u{2CFE}\\u{2E3C}\\u{3002}\\u{A4FF}\\u{A60E}\\u{A6F3}\\u{FE52}\\u{FF0E}\\u{FF61}";

/// Exclamation marks beyond `!`.
const EXCLAMATION_MARKS: &str = "\\u{01C3}\\u{055C}\\u{07F9}\\u{1944}\\u{203C}\\u{2048}\\u{FE15}\\u{FE57}\\u{FF01}";

/// Question marks beyond `?`.
const QUESTION_MARKS: &str = "\\u{037E}\\u{055E}\\u{061F}\\u{1367}\\u{1945}\\u{2047}\\u{2049}\
                              \\u{2CFA}\\u{2CFB}\\u{2E2E}\\u{A60F}\\u{A6F7}\\u{FE56}\\u{FF1F}";

/// Inline chunk alternatives: wiki links, templates, external links, html
/// tags, open link/template prefixes, and bare URLs.
const CHUNK_ALTERNATIVES: &str = "\\[\\[[^\\[\\]\\n]+\\]\\]|\
                                  \\{\\{[^\\{\\}\\n]+\\}\\}|\
                                  \\[[^\\[\\]\\n]+\\]|\
                                  </?[^<>\\[\\]\\{\\}\\n]+>|\
                                  \\[\\[[^\\[\\]\\|\\n]+\\]\\]\\||\
                                  \\{\\{[^\\{\\}\\|\\n]+\\||\
                                  \\b(https?:)?//[^\\x00-\\x20\\s\"\\[\\]\\x7F]+";

/// A real word: letter/digit/underscore runs with optional apostrophe tails.
const WORD_ALTERNATIVE: &str = "\\w+(['\\u{2019}]\\w*)*";

lazy_static! {
    /// Paragraph separators: runs of two or more line terminators, or any
    /// dedicated new-paragraph character.
    pub(crate) static ref SPLIT_PARAGRAPH: Regex =
        Regex::new(&format!("(\\r\\n|\\n|\\r){{2,}}|[{NEW_PARAGRAPH}]")).unwrap();

    /// Single line terminators.
    pub(crate) static ref SPLIT_LINE: Regex =
        Regex::new(&format!("\\r\\n|\\n|\\r|[{NEWLINES_EXTRA}]")).unwrap();

    /// Sentences: non-blank start up to a stop-punctuation run that is
    /// followed by a blank or an end of line. The trailing condition is a
    /// lookahead, so this one pattern uses the backtracking engine.
    pub(crate) static ref SPLIT_SENTENCE: fancy_regex::Regex = fancy_regex::Regex::new(&format!(
        "(?m)[^{BLANKS}].*?[.!?:;\\u{{2026}}{FULL_STOPS}{EXCLAMATION_MARKS}{QUESTION_MARKS}]+(?=[{BLANKS}]|$)"
    ))
    .unwrap();

    /// Inline chunks (wiki markup atoms and URLs).
    pub(crate) static ref SPLIT_CHUNK: Regex = Regex::new(CHUNK_ALTERNATIVES).unwrap();

    /// Words, multi-character markup tokens, then any single character.
    pub(crate) static ref SPLIT_WORD: Regex = Regex::new(&format!(
        "{WORD_ALTERNATIVE}|\\[\\[|\\]\\]|\\{{\\{{|\\}}\\}}|&\\w+;|'''|''|==+|\\{{\\||\\|\\}}|\\|-|."
    ))
    .unwrap();

    /// Real words for the occurrence index and word counting.
    pub(crate) static ref COUNT_WORDS: Regex = Regex::new(WORD_ALTERNATIVE).unwrap();

    /// Chunks for the occurrence index.
    pub(crate) static ref COUNT_CHUNKS: Regex = Regex::new(CHUNK_ALTERNATIVES).unwrap();

    /// At least one character that is not a blank or line/paragraph break.
    /// Tokens failing this test are never used as unique anchors.
    pub(crate) static ref NON_BLANK: Regex =
        Regex::new(&format!("[^{BLANKS}{NEWLINES_ALL}{NEW_PARAGRAPH}]")).unwrap();

    /// Token ends with a line terminator or paragraph break: the preferred
    /// resting border when sliding a gap upwards.
    pub(crate) static ref SLIDE_STOP: Regex =
        Regex::new(&format!("[{NEWLINES_ALL}{NEW_PARAGRAPH}]$")).unwrap();

    /// Token ends with breaking whitespace: a word border for gap sliding.
    pub(crate) static ref SLIDE_BORDER: Regex =
        Regex::new(&format!("[{BLANKS}]$")).unwrap();

    /// Line breaks for clip position search.
    pub(crate) static ref CLIP_LINE: Regex =
        Regex::new(&format!("[{NEWLINES_ALL}{NEW_PARAGRAPH}]+")).unwrap();

    /// Wiki headings and table delimiters occupying a full line.
    pub(crate) static ref CLIP_HEADING: Regex =
        Regex::new("(^|\\n)(==+.+?==+|\\{\\||\\|\\})[^\\n]*").unwrap();

    /// Paragraph breaks for clip position search.
    pub(crate) static ref CLIP_PARAGRAPH: Regex =
        Regex::new(&format!("((\\r\\n|\\n|\\r){{2,}}|[{NEW_PARAGRAPH}])+")).unwrap();

    /// Blank runs for clip position search.
    pub(crate) static ref CLIP_BLANK: Regex =
        Regex::new(&format!("[{BLANKS}]+")).unwrap();

    pub(crate) static ref CLIP_TRIM_NEWLINES_LEFT: Regex =
        Regex::new(&format!("[{NEWLINES_ALL}{NEW_PARAGRAPH}]+$")).unwrap();

    pub(crate) static ref CLIP_TRIM_NEWLINES_RIGHT: Regex =
        Regex::new(&format!("^[{NEWLINES_ALL}{NEW_PARAGRAPH}]+")).unwrap();

    pub(crate) static ref CLIP_TRIM_BLANKS_LEFT: Regex =
        Regex::new(&format!("[{BLANKS}{NEWLINES_ALL}{NEW_PARAGRAPH}]+$")).unwrap();

    pub(crate) static ref CLIP_TRIM_BLANKS_RIGHT: Regex =
        Regex::new(&format!("^[{BLANKS}{NEWLINES_ALL}{NEW_PARAGRAPH}]+")).unwrap();
}

/// The refinement hierarchy, coarsest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SplitLevel {
    Paragraph,
    Line,
    Sentence,
    Chunk,
    Word,
    Character,
}

impl SplitLevel {
    pub(crate) fn name(self) -> &'static str {
        match self {
            SplitLevel::Paragraph => "paragraph",
            SplitLevel::Line => "line",
            SplitLevel::Sentence => "sentence",
            SplitLevel::Chunk => "chunk",
            SplitLevel::Word => "word",
            SplitLevel::Character => "character",
        }
    }
}

/// Collect the match ranges of `level`'s pattern over `text`.
fn match_ranges(level: SplitLevel, text: &str) -> Vec<(usize, usize)> {
    match level {
        SplitLevel::Paragraph => SPLIT_PARAGRAPH
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect(),
        SplitLevel::Line => SPLIT_LINE
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect(),
        // A backtracking-limit error means no further matches are reachable.
        SplitLevel::Sentence => SPLIT_SENTENCE
            .find_iter(text)
            .flatten()
            .map(|m| (m.start(), m.end()))
            .collect(),
        SplitLevel::Chunk => SPLIT_CHUNK
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect(),
        SplitLevel::Word => SPLIT_WORD
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect(),
        SplitLevel::Character => text
            .char_indices()
            .map(|(i, c)| (i, i + c.len_utf8()))
            .collect(),
    }
}

/// Split `text` into consecutive segments at `level`: every pattern match
/// becomes a segment, and so does every unmatched stretch between matches.
/// Concatenating the segments reproduces `text` exactly.
pub(crate) fn segment_ranges(level: SplitLevel, text: &str) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut last = 0;
    for (start, end) in match_ranges(level, text) {
        if start > last {
            segments.push((last, start));
        }
        segments.push((start, end));
        last = end;
    }
    if last < text.len() {
        segments.push((last, text.len()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_texts(level: SplitLevel, text: &str) -> Vec<&str> {
        segment_ranges(level, text)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect()
    }

    #[test]
    fn paragraph_splits_on_double_newline() {
        assert_eq!(
            segment_texts(SplitLevel::Paragraph, "one\n\ntwo"),
            vec!["one", "\n\n", "two"]
        );
    }

    #[test]
    fn paragraph_keeps_single_newlines() {
        assert_eq!(
            segment_texts(SplitLevel::Paragraph, "one\ntwo"),
            vec!["one\ntwo"]
        );
    }

    #[test]
    fn line_splits_on_every_terminator() {
        assert_eq!(
            segment_texts(SplitLevel::Line, "a\nb\r\nc"),
            vec!["a", "\n", "b", "\r\n", "c"]
        );
    }

    #[test]
    fn sentence_requires_trailing_blank_or_end() {
        assert_eq!(
            segment_texts(SplitLevel::Sentence, "e.g. it works."),
            vec!["e.g.", " ", "it works."]
        );
    }

    #[test]
    fn chunk_matches_wiki_markup() {
        assert_eq!(
            segment_texts(SplitLevel::Chunk, "see [[Main Page]] or {{tmpl}}"),
            vec!["see ", "[[Main Page]]", " or ", "{{tmpl}}"]
        );
    }

    #[test]
    fn chunk_matches_urls() {
        let segments = segment_texts(SplitLevel::Chunk, "at https://example.org/x now");
        assert!(segments.contains(&"https://example.org/x"));
    }

    #[test]
    fn word_keeps_markup_atoms() {
        // A word swallows a directly attached apostrophe run, so the closing
        // bold markup sticks to "bold"; the opening markup stands alone.
        assert_eq!(
            segment_texts(SplitLevel::Word, "'''bold''' [[x]]"),
            vec!["'''", "bold'''", " ", "[[", "x", "]]"]
        );
    }

    #[test]
    fn word_keeps_apostrophes_inside_words() {
        assert_eq!(
            segment_texts(SplitLevel::Word, "it's fine"),
            vec!["it's", " ", "fine"]
        );
    }

    #[test]
    fn character_splits_code_points() {
        assert_eq!(
            segment_texts(SplitLevel::Character, "añc"),
            vec!["a", "ñ", "c"]
        );
    }

    #[test]
    fn segments_cover_input() {
        let text = "== head ==\nsome text, [[link|label]] and more\n\nnext";
        for level in [
            SplitLevel::Paragraph,
            SplitLevel::Line,
            SplitLevel::Sentence,
            SplitLevel::Chunk,
            SplitLevel::Word,
            SplitLevel::Character,
        ] {
            let joined: String = segment_texts(level, text).concat();
            assert_eq!(joined, text, "level {}", level.name());
        }
    }

    #[test]
    fn non_blank_rejects_whitespace_only() {
        assert!(!NON_BLANK.is_match(" \t\n"));
        assert!(NON_BLANK.is_match(" a "));
    }

    #[test]
    fn slide_patterns_anchor_at_token_end() {
        assert!(SLIDE_STOP.is_match("text\n"));
        assert!(!SLIDE_STOP.is_match("text\nmore"));
        assert!(SLIDE_BORDER.is_match("word "));
        assert!(!SLIDE_BORDER.is_match(" word"));
    }
}
