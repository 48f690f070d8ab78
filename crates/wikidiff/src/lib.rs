//! A visual inline-style diff engine with block move detection, tuned for
//! prose-like text and wiki markup.
//!
//! Given two versions of a text, [`Differ::diff`] produces a linear stream of
//! typed [`Fragment`]s describing unchanged runs, deletions, insertions, and
//! moved blocks. A moved block appears twice: highlighted at its new position
//! and as a mark at its original position, so a reader can follow the
//! movement. Renderers consume the stream; see the `wikidiff_ansi` crate for
//! a terminal formatter.
//!
//! The matcher anchors on tokens that are unique to both versions and works
//! through six refinement levels, from paragraphs down to single characters
//! inside changed words.

pub use config::{ConfigError, DiffConfig};
pub use differ::Differ;
pub use fragment::{rebuild_version, Fragment, FragmentKind, MoveDirection, OmissionKind, Version};

mod block;
mod config;
mod differ;
mod fragment;
mod patterns;
mod token;

/// Diff two versions with the default configuration.
pub fn diff(old: &str, new: &str) -> Vec<Fragment> {
    let mut differ = Differ::default();
    differ.diff(old, new)
}
