//! Clipping of long unchanged stretches from the fragment stream.
//!
//! Every sufficiently long unmoved `=` fragment is searched for a good cut
//! position from each side, preferring headings, then paragraph breaks, then
//! line breaks, then blanks, then a fixed character count. The elided middle
//! is replaced by a fragment separator with omission indicators where the
//! cut is not self-evident.

use crate::fragment::{Fragment, FragmentKind, OmissionKind};
use crate::patterns::{
    CLIP_BLANK, CLIP_HEADING, CLIP_LINE, CLIP_PARAGRAPH, CLIP_TRIM_BLANKS_LEFT,
    CLIP_TRIM_BLANKS_RIGHT, CLIP_TRIM_NEWLINES_LEFT, CLIP_TRIM_NEWLINES_RIGHT,
};

use super::Differ;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CutKind {
    Heading,
    Paragraph,
    Line,
    Blank,
    Chars,
    Fixed,
}

/// Largest char-boundary position not above `index`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl Differ {
    pub(super) fn clip_diff_fragments(&self, fragments: &mut Vec<Fragment>) {
        // The trivial no-change stream stays as is.
        if fragments.len() == 5 {
            return;
        }
        let config = &self.config;

        let min_right = [
            config.clip_heading_right,
            config.clip_paragraph_right_min,
            config.clip_line_right_min,
            config.clip_blank_right_min,
            config.clip_chars_right,
        ]
        .into_iter()
        .min()
        .unwrap_or(0);
        let min_left = [
            config.clip_heading_left,
            config.clip_paragraph_left_min,
            config.clip_line_left_min,
            config.clip_blank_left_min,
            config.clip_chars_left,
        ]
        .into_iter()
        .min()
        .unwrap_or(0);

        let mut index = 0;
        while index < fragments.len() {
            // Only unmoved unchanged blocks long enough to cut.
            if fragments[index].kind != FragmentKind::Same || fragments[index].color != 0 {
                index += 1;
                continue;
            }
            let text = fragments[index].text.clone();
            if text.len() < min_right && text.len() < min_left {
                index += 1;
                continue;
            }

            // Line start positions, including text start and end.
            let mut lines: Vec<usize> = Vec::new();
            let mut last_match_end = 0;
            for m in CLIP_LINE.find_iter(&text) {
                lines.push(m.start());
                last_match_end = m.end();
            }
            if lines.first() != Some(&0) {
                lines.insert(0, 0);
            }
            if last_match_end != text.len() {
                lines.push(text.len());
            }

            // Heading positions.
            let mut headings: Vec<usize> = Vec::new();
            let mut headings_end: Vec<usize> = Vec::new();
            for m in CLIP_HEADING.find_iter(&text) {
                headings.push(m.start());
                headings_end.push(m.end());
            }

            // Paragraph positions, including text start and end.
            let mut paragraphs: Vec<usize> = Vec::new();
            let mut last_match_end = 0;
            for m in CLIP_PARAGRAPH.find_iter(&text) {
                paragraphs.push(m.start());
                last_match_end = m.end();
            }
            if paragraphs.first() != Some(&0) {
                paragraphs.insert(0, 0);
            }
            if last_match_end != text.len() {
                paragraphs.push(text.len());
            }

            // The first and last content fragments keep their outer side.
            let is_first_content = fragments[..index].iter().all(|f| {
                matches!(
                    f.kind,
                    FragmentKind::ContainerStart | FragmentKind::FragmentStart
                )
            });
            let is_last_content = fragments[index + 1..].iter().all(|f| {
                matches!(
                    f.kind,
                    FragmentKind::ContainerEnd | FragmentKind::FragmentEnd
                )
            });

            // Cut position from the left.
            let mut left: Option<(usize, CutKind)> = None;
            if !is_first_content {
                let range_left_max = if config.clip_lines_left_max < lines.len() {
                    lines[config.clip_lines_left_max]
                } else {
                    text.len()
                };

                for &end in &headings_end {
                    if end > config.clip_heading_left || end > range_left_max {
                        break;
                    }
                    left = Some((end, CutKind::Heading));
                    break;
                }

                if left.is_none() {
                    for &p in &paragraphs {
                        if p > config.clip_paragraph_left_max || p > range_left_max {
                            break;
                        }
                        if p > config.clip_paragraph_left_min {
                            left = Some((p, CutKind::Paragraph));
                            break;
                        }
                    }
                }

                if left.is_none() {
                    for &l in &lines {
                        if l > config.clip_line_left_max || l > range_left_max {
                            break;
                        }
                        if l > config.clip_line_left_min {
                            left = Some((l, CutKind::Line));
                            break;
                        }
                    }
                }

                if left.is_none() && config.clip_blank_left_min <= text.len() {
                    let start = floor_char_boundary(&text, config.clip_blank_left_min);
                    if let Some(m) = CLIP_BLANK.find_at(&text, start) {
                        if m.start() < config.clip_blank_left_max && m.start() < range_left_max {
                            left = Some((m.start(), CutKind::Blank));
                        }
                    }
                }

                if left.is_none() && config.clip_chars_left < range_left_max {
                    left = Some((config.clip_chars_left, CutKind::Chars));
                }

                if left.is_none() {
                    left = Some((range_left_max, CutKind::Fixed));
                }
            }

            // Cut position from the right.
            let mut right: Option<(usize, CutKind)> = None;
            if !is_last_content {
                let range_right_min = if lines.len() >= config.clip_lines_right_max {
                    lines[lines.len() - config.clip_lines_right_max]
                } else {
                    0
                };

                for &h in headings.iter().rev() {
                    if h < text.len().saturating_sub(config.clip_heading_right)
                        || h < range_right_min
                    {
                        break;
                    }
                    right = Some((h, CutKind::Heading));
                    break;
                }

                if right.is_none() {
                    for &p in paragraphs.iter().rev() {
                        if p < text.len().saturating_sub(config.clip_paragraph_right_max)
                            || p < range_right_min
                        {
                            break;
                        }
                        if p < text.len().saturating_sub(config.clip_paragraph_right_min) {
                            right = Some((p, CutKind::Paragraph));
                            break;
                        }
                    }
                }

                if right.is_none() {
                    for &l in lines.iter().rev() {
                        if l < text.len().saturating_sub(config.clip_line_right_max)
                            || l < range_right_min
                        {
                            break;
                        }
                        if l < text.len().saturating_sub(config.clip_line_right_min) {
                            right = Some((l, CutKind::Line));
                            break;
                        }
                    }
                }

                if right.is_none() {
                    let mut start = text.len().saturating_sub(config.clip_blank_right_max);
                    if start < range_right_min {
                        start = range_right_min;
                    }
                    let mut at = floor_char_boundary(&text, start);
                    let mut last_blank: Option<usize> = None;
                    while let Some(m) = CLIP_BLANK.find_at(&text, at) {
                        if m.start() > text.len().saturating_sub(config.clip_blank_right_min) {
                            if let Some(pos) = last_blank {
                                right = Some((pos, CutKind::Blank));
                            }
                            break;
                        }
                        last_blank = Some(m.start());
                        at = m.end();
                    }
                }

                if right.is_none()
                    && text.len().saturating_sub(config.clip_chars_right) > range_right_min
                {
                    right = Some((text.len() - config.clip_chars_right, CutKind::Chars));
                }

                if right.is_none() {
                    right = Some((range_right_min, CutKind::Fixed));
                }
            }

            // Skip when the kept ranges overlap or come too close.
            if let (Some((l, _)), Some((r, _))) = (left, right) {
                if l > r || r - l < config.clip_skip_chars {
                    index += 1;
                    continue;
                }
                let mut skip_lines = 0;
                for &line in &lines {
                    if line > r || skip_lines > config.clip_skip_lines {
                        break;
                    }
                    if line > l {
                        skip_lines += 1;
                    }
                }
                if skip_lines < config.clip_skip_lines {
                    index += 1;
                    continue;
                }
            }
            if left.is_none() && right.is_none() {
                index += 1;
                continue;
            }

            // Cut the fragment apart.
            let left_part = left.map(|(pos, kind)| {
                let pos = floor_char_boundary(&text, pos);
                let mut kept = CLIP_TRIM_NEWLINES_LEFT.replace(&text[..pos], "").into_owned();
                let omission = match kind {
                    CutKind::Chars => Some(OmissionKind::Chars),
                    CutKind::Blank => Some(OmissionKind::BlankBefore),
                    _ => None,
                };
                if omission.is_some() {
                    kept = CLIP_TRIM_BLANKS_LEFT.replace(&kept, "").into_owned();
                }
                (kept, omission)
            });
            let right_part = right.map(|(pos, kind)| {
                let pos = floor_char_boundary(&text, pos);
                let mut kept = CLIP_TRIM_NEWLINES_RIGHT.replace(&text[pos..], "").into_owned();
                let omission = match kind {
                    CutKind::Chars => Some(OmissionKind::Chars),
                    CutKind::Blank => Some(OmissionKind::BlankAfter),
                    _ => None,
                };
                if omission.is_some() {
                    kept = CLIP_TRIM_BLANKS_RIGHT.replace(&kept, "").into_owned();
                }
                (kept, omission)
            });

            fragments.remove(index);
            let mut position = index;
            if let Some((kept, omission)) = &left_part {
                fragments.insert(
                    position,
                    Fragment::text(FragmentKind::Same, kept.clone(), 0),
                );
                position += 1;
                if let Some(kind) = omission {
                    fragments.insert(position, Fragment::marker(FragmentKind::Omission(*kind), 0));
                    position += 1;
                }
            }
            if left_part.is_some() && right_part.is_some() {
                fragments.insert(position, Fragment::marker(FragmentKind::FragmentEnd, 0));
                position += 1;
                fragments.insert(position, Fragment::marker(FragmentKind::Separator, 0));
                position += 1;
                fragments.insert(position, Fragment::marker(FragmentKind::FragmentStart, 0));
                position += 1;
            }
            if let Some((kept, omission)) = &right_part {
                if let Some(kind) = omission {
                    fragments.insert(position, Fragment::marker(FragmentKind::Omission(*kind), 0));
                    position += 1;
                }
                fragments.insert(
                    position,
                    Fragment::text(FragmentKind::Same, kept.clone(), 0),
                );
                position += 1;
            }
            index = position + 1;
        }
    }
}
