//! Table dumps of the intermediate structures through the `log` facade.

use crate::block::{Block, Group};
use crate::fragment::Fragment;
use crate::token::VersionText;

/// Shorten and escape a text for one dump cell.
fn shorten(text: &str) -> String {
    const MAX: usize = 50;
    const TAIL: usize = 15;

    let escaped = text.replace('\n', "\\n").replace('\t', "  ");
    let chars: Vec<char> = escaped.chars().collect();
    if chars.len() <= MAX {
        return format!("\"{escaped}\"");
    }
    let head: String = chars[..MAX - 1 - TAIL].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("\"{head}…{tail}\"")
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

pub(super) fn dump_tokens(name: &str, version: &VersionText) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut dump = format!(
        "first: {}\tlast: {}\ni\tlink\t(prev\tnext)\tuniq\t#num\ttoken\n",
        fmt_opt(version.first),
        fmt_opt(version.last)
    );
    for i in version.iter_live() {
        let token = &version.tokens[i];
        dump.push_str(&format!(
            "{i}\t{}\t({}\t{})\t{}\t#{}\t{}\n",
            fmt_opt(token.link),
            fmt_opt(token.prev),
            fmt_opt(token.next),
            token.unique,
            fmt_opt(token.number),
            shorten(version.token_text(i))
        ));
    }
    log::debug!("{name}:\n{dump}");
}

pub(super) fn dump_blocks(name: &str, blocks: &[Block]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut dump =
        "i\toldBl\tnewBl\toldNm\tnewNm\tcount\tuniq\twords\tchars\tkind\tsect\tgroup\tfixed\tmoved\ttext\n"
            .to_string();
    for (i, block) in blocks.iter().enumerate() {
        dump.push_str(&format!(
            "{i}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:?}\t{}\t{}\t{}\t{}\t{}\n",
            fmt_opt(block.old_block),
            fmt_opt(block.new_block),
            fmt_opt(block.old_number),
            fmt_opt(block.new_number),
            block.count,
            block.unique,
            block.words,
            block.chars,
            block.kind,
            fmt_opt(block.section),
            fmt_opt(block.group),
            block.fixed,
            fmt_opt(block.moved),
            shorten(&block.text)
        ));
    }
    log::debug!("{name}:\n{dump}");
}

pub(super) fn dump_groups(name: &str, groups: &[Group]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut dump =
        "i\toldNm\tblSta\tblEnd\tuniq\tmaxWo\twords\tchars\tfixed\tmFrom\tcolor\n".to_string();
    for (i, group) in groups.iter().enumerate() {
        dump.push_str(&format!(
            "{i}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            fmt_opt(group.old_number),
            group.block_start,
            group.block_end,
            group.unique,
            group.max_words,
            group.words,
            group.chars,
            group.fixed,
            fmt_opt(group.moved_from),
            group.color
        ));
    }
    log::debug!("{name}:\n{dump}");
}

pub(super) fn dump_fragments(name: &str, fragments: &[Fragment]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut dump = "i\tkind\tcolor\ttext\n".to_string();
    for (i, fragment) in fragments.iter().enumerate() {
        dump.push_str(&format!(
            "{i}\t{}\t{}\t{}\n",
            fragment.kind,
            fragment.color,
            shorten(&fragment.text)
        ));
    }
    log::debug!("{name}:\n{dump}");
}
