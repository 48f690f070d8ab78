//! The diff engine: owns both version texts and runs the refinement
//! pipeline, block-move detection, fragment emission, and clipping.

use rustc_hash::FxHashMap;

use crate::block::{Block, Group, Section};
use crate::config::{ConfigError, DiffConfig};
use crate::fragment::{rebuild_version, Fragment, FragmentKind, Version};
use crate::patterns::{SplitLevel, COUNT_WORDS};
use crate::token::VersionText;

mod blocks;
mod chars;
mod clip;
mod debug;
mod emit;
mod linker;
mod place;
mod slide;

pub(crate) use linker::Symbols;

/// Count real words in `text`.
pub(crate) fn word_count(text: &str) -> u32 {
    COUNT_WORDS.find_iter(text).count() as u32
}

/// The diff engine. One engine handles one `diff` call at a time; every call
/// fully reinitializes the internal state, so an engine value can be reused
/// sequentially.
pub struct Differ {
    config: DiffConfig,

    new_text: VersionText,
    old_text: VersionText,

    /// Persistent symbol table, shared by all refinement levels.
    symbols: Symbols,
    /// Linked region borders for downward and upward expansion, carried
    /// between refinement levels.
    borders_down: Vec<(usize, usize)>,
    borders_up: Vec<(usize, usize)>,

    blocks: Vec<Block>,
    sections: Vec<Section>,
    groups: Vec<Group>,
    /// Word count of the longest linked block, feeding the unlink heuristic.
    max_words: u32,

    /// The self-test found the fragment stream inconsistent with the inputs.
    error: bool,

    timers: FxHashMap<&'static str, std::time::Instant>,
}

impl Default for Differ {
    fn default() -> Self {
        Differ::with_config(DiffConfig::default())
    }
}

impl Differ {
    /// Create an engine, validating the configuration.
    pub fn new(config: DiffConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Differ::with_config(config))
    }

    fn with_config(config: DiffConfig) -> Self {
        Differ {
            config,
            new_text: VersionText::default(),
            old_text: VersionText::default(),
            symbols: Symbols::default(),
            borders_down: Vec::new(),
            borders_up: Vec::new(),
            blocks: Vec::new(),
            sections: Vec::new(),
            groups: Vec::new(),
            max_words: 0,
            error: false,
            timers: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// True when the last `diff` call failed its consistency self-test
    /// (`unit_testing` option).
    pub fn error(&self) -> bool {
        self.error
    }

    /// Diff two text versions into the typed fragment stream.
    pub fn diff(&mut self, old: &str, new: &str) -> Vec<Fragment> {
        self.time("total");
        self.error = false;

        // Strip one matching trailing newline off both versions.
        let (mut old, mut new) = (old, new);
        if self.config.strip_trailing_newline && old.ends_with('\n') && new.ends_with('\n') {
            old = &old[..old.len() - 1];
            new = &new[..new.len() - 1];
        }

        self.new_text = VersionText::new(new);
        self.old_text = VersionText::new(old);
        self.symbols = Symbols::default();
        self.borders_down.clear();
        self.borders_up.clear();
        self.blocks.clear();
        self.sections.clear();
        self.groups.clear();
        self.max_words = 0;

        // Trivial case: no change.
        if self.new_text.text == self.old_text.text {
            return vec![
                Fragment::marker(FragmentKind::ContainerStart, 0),
                Fragment::marker(FragmentKind::FragmentStart, 0),
                Fragment::marker(FragmentKind::Same, 0),
                Fragment::marker(FragmentKind::FragmentEnd, 0),
                Fragment::marker(FragmentKind::ContainerEnd, 0),
            ];
        }

        // Split into paragraphs and link them.
        self.time("paragraph split");
        self.new_text.split_text(SplitLevel::Paragraph, None);
        self.old_text.split_text(SplitLevel::Paragraph, None);
        self.time_end("paragraph split");
        self.calculate_diff(SplitLevel::Line, false, false, None, None, false, 0);

        // Refine unmatched tokens level by level, re-linking after each.
        for level in [SplitLevel::Line, SplitLevel::Sentence, SplitLevel::Chunk] {
            self.time(level.name());
            self.new_text.split_refine(level);
            self.old_text.split_refine(level);
            self.time_end(level.name());
            self.calculate_diff(level, false, false, None, None, false, 0);
        }

        // Word level recurses into unresolved gaps.
        self.time("word split");
        self.new_text.split_refine(SplitLevel::Word);
        self.old_text.split_refine(SplitLevel::Word);
        self.time_end("word split");
        self.calculate_diff(SplitLevel::Word, true, false, None, None, false, 0);

        self.time("word slide");
        slide::slide_gaps(&mut self.new_text, &mut self.old_text);
        slide::slide_gaps(&mut self.old_text, &mut self.new_text);
        self.time_end("word slide");

        // Character refinement of gaps with similar token structure.
        if self.config.char_diff {
            self.time("character split");
            self.split_refine_chars();
            self.time_end("character split");
            self.calculate_diff(SplitLevel::Character, true, false, None, None, false, 0);

            self.time("character slide");
            slide::slide_gaps(&mut self.new_text, &mut self.old_text);
            slide::slide_gaps(&mut self.old_text, &mut self.new_text);
            self.time_end("character slide");
        }

        debug_assert!(self.new_text.check_list_integrity());
        debug_assert!(self.old_text.check_list_integrity());

        // Refinement is over; release the linker state and word indexes.
        self.symbols = Symbols::default();
        self.borders_down = Vec::new();
        self.borders_up = Vec::new();
        self.new_text.words.clear();
        self.old_text.words.clear();

        self.new_text.enumerate_tokens();
        self.old_text.enumerate_tokens();

        self.time("blocks");
        self.detect_blocks();
        self.time_end("blocks");

        // Block detection is over; the arenas are no longer needed.
        self.new_text.tokens = Vec::new();
        self.new_text.first = None;
        self.new_text.last = None;
        self.old_text.tokens = Vec::new();
        self.old_text.first = None;
        self.old_text.last = None;

        let mut fragments = self.get_diff_fragments();

        self.blocks = Vec::new();
        self.groups = Vec::new();
        self.sections = Vec::new();

        if self.config.unit_testing {
            self.run_consistency_check(&fragments);
        }

        if self.config.debug {
            debug::dump_fragments("Fragments before clipping", &fragments);
        }

        if !self.config.full_diff {
            self.time("clip");
            self.clip_diff_fragments(&mut fragments);
            self.time_end("clip");
        }

        if self.config.debug {
            debug::dump_fragments("Fragments", &fragments);
        }

        self.time_end("total");
        fragments
    }

    /// Detect blocks, sections, and groups; choose fixed paths; unlink weak
    /// blocks; position deletions, insertions, and move marks.
    fn detect_blocks(&mut self) {
        if self.config.debug {
            debug::dump_tokens("Old text", &self.old_text);
            debug::dump_tokens("New text", &self.new_text);
        }

        self.get_same_blocks();
        self.get_sections();
        self.get_groups();
        self.set_fixed();

        // Demote matched blocks that are too short and too common. Only for
        // texts that actually have blocks of the minimum length.
        let mut unlink_count = 0;
        if self.config.unlink_blocks && self.max_words >= self.config.block_min_length {
            self.time("unlink");
            let mut unlinked = true;
            while unlinked && unlink_count < self.config.unlink_max {
                unlinked = self.unlink_blocks();
                if unlinked {
                    unlink_count += 1;
                    slide::slide_gaps(&mut self.new_text, &mut self.old_text);
                    slide::slide_gaps(&mut self.old_text, &mut self.new_text);

                    self.max_words = 0;
                    self.get_same_blocks();
                    self.get_sections();
                    self.get_groups();
                    self.set_fixed();
                }
            }
            self.time_end("unlink");
        }

        self.get_del_blocks();
        self.position_del_blocks();
        self.get_ins_blocks();
        self.set_ins_groups();
        self.insert_marks();

        if self.config.debug {
            log::debug!("unlink cycles: {unlink_count}");
            debug::dump_groups("Groups", &self.groups);
            debug::dump_blocks("Blocks", &self.blocks);
        }
    }

    /// Rebuild both versions from the fragment stream and flag mismatches.
    fn run_consistency_check(&mut self, fragments: &[Fragment]) {
        let new_rebuilt = rebuild_version(fragments, Version::New);
        if new_rebuilt != self.new_text.text {
            self.error = true;
            log::error!("diff not consistent with the new text version");
        }
        let old_rebuilt = rebuild_version(fragments, Version::Old);
        if old_rebuilt != self.old_text.text {
            self.error = true;
            log::error!("diff not consistent with the old text version");
        }
    }

    fn time(&mut self, label: &'static str) {
        if self.config.timer {
            self.timers.insert(label, std::time::Instant::now());
        }
    }

    fn time_end(&mut self, label: &'static str) {
        if self.config.timer {
            if let Some(start) = self.timers.remove(label) {
                log::debug!("{label}: {:.3} ms", start.elapsed().as_secs_f64() * 1e3);
            }
        }
    }
}
