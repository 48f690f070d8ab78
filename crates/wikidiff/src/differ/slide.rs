//! Gap sliding: canonicalize ambiguous identical runs.
//!
//! An unmatched run flanked by identical matched tokens can sit at several
//! equivalent positions. Sliding moves it down as far as possible, then back
//! up to the most stable border: a line break if one is reachable, otherwise
//! the last blank/word boundary.

use crate::patterns::{SLIDE_BORDER, SLIDE_STOP};
use crate::token::VersionText;

/// Slide the gaps of `text`, mirroring every link transfer in `linked`.
/// Runs symmetrically: once per version, with the roles swapped.
pub(super) fn slide_gaps(text: &mut VersionText, linked: &mut VersionText) {
    let mut gap_start: Option<usize> = None;
    let mut cursor = text.first;

    while let Some(i) = cursor {
        if gap_start.is_none() && text.tokens[i].link.is_none() {
            gap_start = Some(i);
        } else if let Some(start) = gap_start {
            if text.tokens[i].link.is_some() {
                let Some(back_of_gap) = text.tokens[i].prev else {
                    break;
                };
                slide_gap(text, linked, start, back_of_gap);
                gap_start = None;
            }
        }
        cursor = text.tokens[i].next;
    }
}

fn slide_gap(text: &mut VersionText, linked: &mut VersionText, front: usize, back: usize) {
    let mut gap_front = front;
    let mut gap_back = back;

    // Slide down while the unmatched token at the gap front equals the
    // matched token just past the gap; each transfer shifts the gap by one.
    loop {
        let Some(past_gap) = text.tokens[gap_back].next else {
            break;
        };
        if text.tokens[gap_front].link.is_some()
            || text.tokens[past_gap].link.is_none()
            || text.token_text(gap_front) != text.token_text(past_gap)
        {
            break;
        }
        let Some(target) = text.tokens[past_gap].link else {
            break;
        };
        text.tokens[gap_front].link = Some(target);
        linked.tokens[target].link = Some(gap_front);
        text.tokens[past_gap].link = None;

        let Some(next_front) = text.tokens[gap_front].next else {
            break;
        };
        gap_front = next_front;
        gap_back = past_gap;
    }

    // Scan upwards through matched tokens equal to the gap tail, remembering
    // the best border to stop at: a line break wins outright, a change of
    // blank/word category is remembered as a fallback.
    let gap_front_blank = SLIDE_BORDER.is_match(text.token_text(gap_front));
    let mut front_cursor = text.tokens[gap_front].prev;
    let mut back_cursor = Some(gap_back);
    let mut front_stop = front_cursor;

    if text.tokens[gap_back].link.is_none() {
        while let (Some(f), Some(b)) = (front_cursor, back_cursor) {
            if text.tokens[f].link.is_none() || text.token_text(f) != text.token_text(b) {
                break;
            }
            if SLIDE_STOP.is_match(text.token_text(f)) {
                front_stop = Some(f);
                break;
            }
            if SLIDE_BORDER.is_match(text.token_text(f)) != gap_front_blank {
                front_stop = Some(f);
            }
            front_cursor = text.tokens[f].prev;
            back_cursor = text.tokens[b].prev;
        }
    }

    // Transfer links upwards until the stop position.
    let mut front_cursor = text.tokens[gap_front].prev;
    let mut back_cursor = Some(gap_back);
    while let (Some(f), Some(b)) = (front_cursor, back_cursor) {
        if front_cursor == front_stop {
            break;
        }
        if text.tokens[f].link.is_none()
            || text.tokens[b].link.is_some()
            || text.token_text(f) != text.token_text(b)
        {
            break;
        }
        let Some(target) = text.tokens[f].link else {
            break;
        };
        text.tokens[b].link = Some(target);
        linked.tokens[target].link = Some(b);
        text.tokens[f].link = None;

        front_cursor = text.tokens[f].prev;
        back_cursor = text.tokens[b].prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::SplitLevel;

    fn version(text: &str) -> VersionText {
        let mut version = VersionText::new(text);
        version.split_text(SplitLevel::Paragraph, None);
        version.split_refine(SplitLevel::Word);
        version
    }

    fn link_by_index(a: &mut VersionText, b: &mut VersionText, pairs: &[(usize, usize)]) {
        for &(i, j) in pairs {
            let ai = a.iter_live().nth(i).unwrap();
            let bj = b.iter_live().nth(j).unwrap();
            a.tokens[ai].link = Some(bj);
            b.tokens[bj].link = Some(ai);
        }
    }

    fn linked_texts(version: &VersionText) -> Vec<(String, bool)> {
        version
            .iter_live()
            .map(|i| {
                (
                    version.token_text(i).to_string(),
                    version.tokens[i].link.is_some(),
                )
            })
            .collect()
    }

    #[test]
    fn ambiguous_run_slides_to_word_border() {
        // Old "x a a y", new "x a a a y": the inserted "a" is ambiguous. Link
        // the shared prefix "x a" and the suffix "a y" crosswise so the gap
        // sits mid-run, then slide.
        let mut new = version("x a a a y");
        let mut old = version("x a a y");
        // new tokens: x _ a _ a _ a _ y ; old tokens: x _ a _ a _ y
        link_by_index(&mut new, &mut old, &[(0, 0), (1, 1), (2, 2), (3, 3), (6, 4), (7, 5), (8, 6)]);

        slide_gaps(&mut new, &mut old);
        slide_gaps(&mut old, &mut new);

        // The unmatched pair must sit on one side of the equal run, not in
        // the middle: exactly one "a"+blank pair stays unlinked.
        let states = linked_texts(&new);
        let unmatched: Vec<&str> = states
            .iter()
            .filter(|(_, linked)| !linked)
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(unmatched.len(), 2);
        assert!(unmatched.contains(&"a"));
        assert!(old.iter_live().all(|i| old.tokens[i].link.is_some()));
    }
}
