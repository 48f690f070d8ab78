//! ANSI terminal formatter for the `wikidiff` fragment stream.
//!
//! Renders insertions, deletions, and moved blocks with 256-color escape
//! codes, marks the original position of moved blocks with `◀`/`▶`, and
//! highlights whitespace inside changed text so that blank-only edits stay
//! visible. Nested scopes are tracked on a color stack, so closing a scope
//! restores the enclosing color instead of resetting the terminal.

use lazy_static::lazy_static;
use regex::Regex;
use wikidiff::{Fragment, FragmentKind, MoveDirection, OmissionKind};

lazy_static! {
    /// Blank-only or single-character block text gets the stronger
    /// background highlight.
    static ref BLANK_BLOCK: Regex = Regex::new("^(?:[^\\t\\S]+|[^\\t])$").unwrap();
}

const MSG_NO_CHANGE: &str = "(No difference)";
const MARK_LEFT: &str = "◀";
const MARK_RIGHT: &str = "▶";
const MARK_LEFT_ASCII: &str = "<";
const MARK_RIGHT_ASCII: &str = ">";

const NEWLINE_SYMBOL: &str = "¶\n";
const TAB_SYMBOL: &str = "→";
const SPACE_SYMBOL: &str = "·";
const OMITTED_SYMBOL: &str = "…";

const COLOR_INSERT: u8 = 10;
const COLOR_DELETE: u8 = 9;
const COLOR_SEPARATOR: u8 = 5;
/// Default color for moved blocks and marks.
const COLOR_MOVED: u8 = 3;
/// Rainbow scheme for `colored_blocks`.
const BLOCK_COLORS: [u8; 9] = [226, 136, 214, 105, 165, 128, 14, 63, 133];

/// Stack of active color codes; popping restores the enclosing scope.
struct ColorStack {
    codes: Vec<String>,
}

impl ColorStack {
    fn new() -> Self {
        ColorStack { codes: Vec::new() }
    }

    fn push(&mut self, fg: Option<u8>, bg: Option<u8>) -> String {
        let mut code = String::from("\x1b[00");
        if let Some(fg) = fg {
            code.push_str(&format!(";38;5;{fg}"));
        }
        if let Some(bg) = bg {
            code.push_str(&format!(";48;5;{bg}"));
        }
        code.push('m');
        self.codes.push(code.clone());
        code
    }

    fn pop(&mut self) -> String {
        self.codes.pop();
        match self.codes.last() {
            Some(code) => code.clone(),
            None => String::from("\x1b[0m"),
        }
    }

    fn is_balanced(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Formatter options and entry point.
#[derive(Clone, Debug)]
pub struct AnsiFormatter {
    /// Lay out moved blocks as highlighted blocks with marks at the original
    /// positions; when off, moved content renders as a plain deletion at its
    /// original position.
    pub show_block_moves: bool,
    /// Give each moved block its own color instead of one shared color.
    pub colored_blocks: bool,
    /// Use `<`/`>` instead of `◀`/`▶` for terminals without Unicode glyphs.
    pub no_unicode_symbols: bool,
}

impl Default for AnsiFormatter {
    fn default() -> Self {
        AnsiFormatter {
            show_block_moves: true,
            colored_blocks: false,
            no_unicode_symbols: false,
        }
    }
}

impl AnsiFormatter {
    pub fn new() -> Self {
        AnsiFormatter::default()
    }

    fn block_color(&self, color: u32) -> u8 {
        if self.colored_blocks {
            BLOCK_COLORS[color as usize % BLOCK_COLORS.len()]
        } else {
            COLOR_MOVED
        }
    }

    fn mark_symbol(&self, direction: MoveDirection) -> &'static str {
        match (direction, self.no_unicode_symbols) {
            (MoveDirection::Left, false) => MARK_LEFT,
            (MoveDirection::Right, false) => MARK_RIGHT,
            (MoveDirection::Left, true) => MARK_LEFT_ASCII,
            (MoveDirection::Right, true) => MARK_RIGHT_ASCII,
        }
    }

    /// Format a fragment stream into an ANSI-colored string.
    pub fn format(&self, fragments: &[Fragment]) -> String {
        let mut colors = ColorStack::new();

        // No change: only one empty unchanged block between the wrappers.
        // The message sits in its own scope inside the container.
        if fragments.len() == 5 && fragments[2].kind == FragmentKind::Same {
            let mut output = colors.push(None, None);
            output.push_str(&colors.push(None, None));
            output.push_str(MSG_NO_CHANGE);
            output.push_str(&colors.pop());
            output.push_str(&colors.pop());
            debug_assert!(colors.is_balanced());
            return output;
        }

        let mut output = String::new();
        for fragment in fragments {
            let text = &fragment.text;
            let blank = !text.is_empty() && BLANK_BLOCK.is_match(text);

            match fragment.kind {
                FragmentKind::ContainerStart => output.push_str(&colors.push(None, None)),
                FragmentKind::ContainerEnd => output.push_str(&colors.pop()),
                FragmentKind::FragmentStart | FragmentKind::FragmentEnd => {}
                FragmentKind::Separator => {
                    output.push_str(&colors.push(Some(COLOR_SEPARATOR), None));
                    output.push_str("\n@@@ --- @@@\n");
                    output.push_str(&colors.pop());
                }
                FragmentKind::Omission(kind) => match kind {
                    OmissionKind::Chars => output.push_str(OMITTED_SYMBOL),
                    OmissionKind::BlankBefore => {
                        output.push(' ');
                        output.push_str(OMITTED_SYMBOL);
                    }
                    OmissionKind::BlankAfter => {
                        output.push_str(OMITTED_SYMBOL);
                        output.push(' ');
                    }
                },
                FragmentKind::MovedStart(_) => {
                    output.push_str(&colors.push(Some(self.block_color(fragment.color)), None));
                }
                FragmentKind::MovedEnd => output.push_str(&colors.pop()),
                FragmentKind::Same => {
                    let escaped = ansi_escape(text);
                    if fragment.color != 0 {
                        output.push_str(&markup_blanks(&escaped, true));
                    } else {
                        output.push_str(&markup_blanks(&escaped, false));
                    }
                }
                FragmentKind::Deletion => {
                    let escaped = markup_blanks(&ansi_escape(text), true);
                    if blank {
                        output.push_str(&colors.push(Some(0), Some(COLOR_DELETE)));
                    } else {
                        output.push_str(&colors.push(Some(COLOR_DELETE), None));
                    }
                    output.push_str(&escaped);
                    output.push_str(&colors.pop());
                }
                FragmentKind::Insertion => {
                    let escaped = markup_blanks(&ansi_escape(text), true);
                    if blank {
                        output.push_str(&colors.push(Some(0), Some(COLOR_INSERT)));
                    } else {
                        output.push_str(&colors.push(Some(COLOR_INSERT), None));
                    }
                    output.push_str(&escaped);
                    output.push_str(&colors.pop());
                }
                FragmentKind::Mark(direction) => {
                    if self.show_block_moves {
                        output.push_str(&colors.push(Some(0), Some(self.block_color(fragment.color))));
                        output.push_str(self.mark_symbol(direction));
                        output.push_str(&colors.pop());
                    } else {
                        // Without the block-move layout, show the moved text
                        // as a deletion at its original position.
                        let escaped = markup_blanks(&ansi_escape(text), true);
                        if blank {
                            output.push_str(&colors.push(Some(0), Some(COLOR_DELETE)));
                        } else {
                            output.push_str(&colors.push(Some(COLOR_DELETE), None));
                        }
                        output.push_str(&escaped);
                        output.push_str(&colors.pop());
                    }
                }
            }
        }

        debug_assert!(colors.is_balanced());
        output
    }
}

/// Highlight tabs, and with `highlight` also newlines and spaces, inside
/// changed text.
fn markup_blanks(text: &str, highlight: bool) -> String {
    let mut text = text.to_string();
    if highlight {
        text = text.replace(' ', SPACE_SYMBOL);
        text = text.replace('\n', NEWLINE_SYMBOL);
    }
    text.replace('\t', TAB_SYMBOL)
}

/// Neutralize ANSI escape sequences contained in the input text.
fn ansi_escape(text: &str) -> String {
    text.replace("\x1b[", "\\033[")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikidiff::diff;

    #[test]
    fn no_change_renders_message() {
        let fragments = diff("same", "same");
        let output = AnsiFormatter::new().format(&fragments);
        assert!(output.contains(MSG_NO_CHANGE));
    }

    #[test]
    fn insertion_gets_colored() {
        let fragments = diff("hello world", "hello brave world");
        let output = AnsiFormatter::new().format(&fragments);
        assert!(output.contains("\x1b[00;38;5;10m"));
        assert!(output.contains("brave"));
        // The insertion highlights its trailing space.
        assert!(output.contains(&format!("brave{SPACE_SYMBOL}")));
    }

    #[test]
    fn moved_block_renders_mark() {
        let old = "first second third fourth. end of text";
        let new = "end of text first second third fourth.";
        let formatter = AnsiFormatter::new();
        let output = formatter.format(&diff(old, new));
        assert!(output.contains(MARK_LEFT) || output.contains(MARK_RIGHT));
    }

    #[test]
    fn marks_fall_back_to_deletion_without_move_layout() {
        let old = "first second third fourth. end of text";
        let new = "end of text first second third fourth.";
        let formatter = AnsiFormatter {
            show_block_moves: false,
            ..AnsiFormatter::default()
        };
        let output = formatter.format(&diff(old, new));
        assert!(!output.contains(MARK_LEFT));
        assert!(!output.contains(MARK_RIGHT));
    }

    #[test]
    fn input_escape_codes_are_neutralized() {
        let fragments = diff("plain", "plain \x1b[31mred");
        let output = AnsiFormatter::new().format(&fragments);
        assert!(output.contains("\\033[31mred"));
    }

    #[test]
    fn blank_only_insertion_uses_background() {
        let fragments = diff("a.b", "a. b");
        let output = AnsiFormatter::new().format(&fragments);
        assert!(output.contains(";48;5;10m"));
    }
}
