//! The typed fragment stream: the engine's sole data interface to renderers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction hint of a moved block or mark, relative to its counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    Left,
    Right,
}

/// Which side of an omission kept the adjacent blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OmissionKind {
    /// Clipped at a fixed character count.
    Chars,
    /// Clipped at a blank on the left side: a blank precedes the ellipsis.
    BlankBefore,
    /// Clipped at a blank on the right side: a blank follows the ellipsis.
    BlankAfter,
}

/// Fragment type. The serialized notation mirrors the sigils renderers
/// historically consumed: `{`/`}` container, `[`/`]` fragment group, `,`
/// separator, `=`/`-`/`+` content, `(<`/`(>`/`)` moved block, `<`/`>` mark,
/// `~` omission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    ContainerStart,
    ContainerEnd,
    FragmentStart,
    FragmentEnd,
    /// Separator between elided fragment groups.
    Separator,
    /// Unchanged text, inside or outside moved blocks.
    Same,
    Deletion,
    Insertion,
    /// Opens a moved block; closed by `MovedEnd`.
    MovedStart(MoveDirection),
    MovedEnd,
    /// Mark at the original position of a moved group.
    Mark(MoveDirection),
    /// Omission indicator for clipped context.
    Omission(OmissionKind),
}

impl FragmentKind {
    /// Legacy sigil for debug output and language-neutral stream dumps.
    pub fn sigil(self) -> &'static str {
        match self {
            FragmentKind::ContainerStart => "{",
            FragmentKind::ContainerEnd => "}",
            FragmentKind::FragmentStart => "[",
            FragmentKind::FragmentEnd => "]",
            FragmentKind::Separator => ",",
            FragmentKind::Same => "=",
            FragmentKind::Deletion => "-",
            FragmentKind::Insertion => "+",
            FragmentKind::MovedStart(MoveDirection::Left) => "(<",
            FragmentKind::MovedStart(MoveDirection::Right) => "(>",
            FragmentKind::MovedEnd => ")",
            FragmentKind::Mark(MoveDirection::Left) => "<",
            FragmentKind::Mark(MoveDirection::Right) => ">",
            FragmentKind::Omission(OmissionKind::Chars) => "~",
            FragmentKind::Omission(OmissionKind::BlankBefore) => " ~",
            FragmentKind::Omission(OmissionKind::BlankAfter) => "~ ",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sigil())
    }
}

/// One element of the diff fragment stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub kind: FragmentKind,
    /// Color number of the containing moved group, 0 when unmoved.
    pub color: u32,
}

impl Fragment {
    pub(crate) fn marker(kind: FragmentKind, color: u32) -> Self {
        Fragment {
            text: String::new(),
            kind,
            color,
        }
    }

    pub(crate) fn text(kind: FragmentKind, text: String, color: u32) -> Self {
        Fragment { text, kind, color }
    }
}

/// Which version a fragment stream should be flattened back into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    Old,
    New,
}

/// Rebuild one version's plain text from a fragment stream.
///
/// The new projection concatenates `=` and `+` text. The old projection
/// concatenates unmoved `=` and `-` text plus the mark texts, which carry a
/// moved group's old content at its original position. Only an un-clipped
/// stream reproduces the input byte for byte.
pub fn rebuild_version(fragments: &[Fragment], version: Version) -> String {
    let mut output = String::new();
    for fragment in fragments {
        match fragment.kind {
            FragmentKind::Same => {
                if fragment.color == 0 || version == Version::New {
                    output.push_str(&fragment.text);
                }
            }
            FragmentKind::Deletion => {
                // Deletions inside a moved group already appear in the old
                // projection through that group's mark.
                if version == Version::Old && fragment.color == 0 {
                    output.push_str(&fragment.text);
                }
            }
            FragmentKind::Insertion => {
                if version == Version::New {
                    output.push_str(&fragment.text);
                }
            }
            FragmentKind::Mark(_) => {
                if version == Version::Old {
                    output.push_str(&fragment.text);
                }
            }
            _ => {}
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(text: &str, color: u32) -> Fragment {
        Fragment::text(FragmentKind::Same, text.to_string(), color)
    }

    #[test]
    fn rebuild_splits_insertions_and_deletions() {
        let fragments = vec![
            Fragment::marker(FragmentKind::ContainerStart, 0),
            Fragment::marker(FragmentKind::FragmentStart, 0),
            same("keep ", 0),
            Fragment::text(FragmentKind::Deletion, "old".into(), 0),
            Fragment::text(FragmentKind::Insertion, "new".into(), 0),
            Fragment::marker(FragmentKind::FragmentEnd, 0),
            Fragment::marker(FragmentKind::ContainerEnd, 0),
        ];
        assert_eq!(rebuild_version(&fragments, Version::Old), "keep old");
        assert_eq!(rebuild_version(&fragments, Version::New), "keep new");
    }

    #[test]
    fn rebuild_places_moved_text_through_marks() {
        // Old "A B", new "B A": "A" moved right, its mark carries "A" at the
        // original (front) position of the old text.
        let fragments = vec![
            Fragment::marker(FragmentKind::ContainerStart, 0),
            Fragment::marker(FragmentKind::FragmentStart, 0),
            Fragment::text(FragmentKind::Mark(MoveDirection::Right), "A ".into(), 1),
            same("B", 0),
            Fragment::marker(FragmentKind::MovedStart(MoveDirection::Right), 1),
            same(" A", 1),
            Fragment::marker(FragmentKind::MovedEnd, 1),
            Fragment::marker(FragmentKind::FragmentEnd, 0),
            Fragment::marker(FragmentKind::ContainerEnd, 0),
        ];
        assert_eq!(rebuild_version(&fragments, Version::Old), "A B");
        assert_eq!(rebuild_version(&fragments, Version::New), "B A");
    }

    #[test]
    fn sigils_round_trip_distinctly() {
        let kinds = [
            FragmentKind::ContainerStart,
            FragmentKind::ContainerEnd,
            FragmentKind::FragmentStart,
            FragmentKind::FragmentEnd,
            FragmentKind::Separator,
            FragmentKind::Same,
            FragmentKind::Deletion,
            FragmentKind::Insertion,
            FragmentKind::MovedStart(MoveDirection::Left),
            FragmentKind::MovedStart(MoveDirection::Right),
            FragmentKind::MovedEnd,
            FragmentKind::Mark(MoveDirection::Left),
            FragmentKind::Mark(MoveDirection::Right),
            FragmentKind::Omission(OmissionKind::Chars),
            FragmentKind::Omission(OmissionKind::BlankBefore),
            FragmentKind::Omission(OmissionKind::BlankAfter),
        ];
        let mut sigils: Vec<&str> = kinds.iter().map(|k| k.sigil()).collect();
        sigils.sort();
        sigils.dedup();
        assert_eq!(sigils.len(), kinds.len());
    }
}
