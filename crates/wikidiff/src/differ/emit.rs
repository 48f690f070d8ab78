//! Fragment emission: serialize the block list into the typed stream.

use crate::block::BlockKind;
use crate::fragment::{Fragment, FragmentKind, MoveDirection};

use super::Differ;

impl Differ {
    /// Walk the groups in block order and emit the fragment stream: moved
    /// groups are wrapped in start/end markers, mark blocks become `<`/`>`
    /// fragments carrying the moved group's old text, and everything is
    /// enclosed in the container and fragment delimiters.
    pub(super) fn get_diff_fragments(&mut self) -> Vec<Fragment> {
        let mut fragments = Vec::new();

        let mut groups_sort: Vec<usize> = (0..self.groups.len()).collect();
        groups_sort.sort_by_key(|&g| self.groups[g].block_start);

        for &group in &groups_sort {
            let block_start = self.groups[group].block_start;
            let block_end = self.groups[group].block_end;
            let color = self.groups[group].color;

            if color != 0 {
                let direction = match (self.groups[group].moved_from, self.blocks[block_start].group)
                {
                    (Some(from), Some(to)) if from < to => MoveDirection::Left,
                    _ => MoveDirection::Right,
                };
                fragments.push(Fragment::marker(FragmentKind::MovedStart(direction), color));
            }

            for block in block_start..=block_end {
                match self.blocks[block].kind {
                    BlockKind::Same => fragments.push(Fragment::text(
                        FragmentKind::Same,
                        self.blocks[block].text.clone(),
                        color,
                    )),
                    BlockKind::Deletion => fragments.push(Fragment::text(
                        FragmentKind::Deletion,
                        self.blocks[block].text.clone(),
                        color,
                    )),
                    BlockKind::Insertion => fragments.push(Fragment::text(
                        FragmentKind::Insertion,
                        self.blocks[block].text.clone(),
                        color,
                    )),
                    BlockKind::Mark => {
                        let Some(moved) = self.blocks[block].moved else {
                            continue;
                        };

                        // The mark shows the moved group's old content: its
                        // matched and deleted block texts.
                        let mut mark_text = String::new();
                        for moved_block in
                            self.groups[moved].block_start..=self.groups[moved].block_end
                        {
                            if matches!(
                                self.blocks[moved_block].kind,
                                BlockKind::Same | BlockKind::Deletion
                            ) {
                                mark_text.push_str(&self.blocks[moved_block].text);
                            }
                        }

                        let direction = if self.groups[moved].block_start < block_start {
                            MoveDirection::Left
                        } else {
                            MoveDirection::Right
                        };
                        fragments.push(Fragment::text(
                            FragmentKind::Mark(direction),
                            mark_text,
                            self.groups[moved].color,
                        ));
                    }
                }
            }

            if color != 0 {
                fragments.push(Fragment::marker(FragmentKind::MovedEnd, color));
            }
        }

        // Join consecutive fragments of the same kind and color.
        let mut index = 1;
        while index < fragments.len() {
            if fragments[index].kind == fragments[index - 1].kind
                && fragments[index].color == fragments[index - 1].color
                && !fragments[index].text.is_empty()
                && !fragments[index - 1].text.is_empty()
            {
                let joined = fragments.remove(index);
                fragments[index - 1].text.push_str(&joined.text);
            } else {
                index += 1;
            }
        }

        fragments.insert(0, Fragment::marker(FragmentKind::ContainerStart, 0));
        fragments.insert(1, Fragment::marker(FragmentKind::FragmentStart, 0));
        fragments.push(Fragment::marker(FragmentKind::FragmentEnd, 0));
        fragments.push(Fragment::marker(FragmentKind::ContainerEnd, 0));
        fragments
    }
}
