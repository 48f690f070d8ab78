//! Scenario and property tests for the diff engine.

use test_case::test_case;
use wikidiff::{
    diff, rebuild_version, DiffConfig, Differ, Fragment, FragmentKind, Version,
};

mod harness {
    use wikidiff::{Fragment, FragmentKind};

    /// Every opener must be closed: container, fragment group, moved block.
    pub fn assert_balanced(fragments: &[Fragment]) {
        let mut containers = 0i32;
        let mut groups = 0i32;
        let mut moved: Vec<u32> = Vec::new();
        for fragment in fragments {
            match fragment.kind {
                FragmentKind::ContainerStart => containers += 1,
                FragmentKind::ContainerEnd => containers -= 1,
                FragmentKind::FragmentStart => groups += 1,
                FragmentKind::FragmentEnd => groups -= 1,
                FragmentKind::MovedStart(_) => moved.push(fragment.color),
                FragmentKind::MovedEnd => {
                    assert_eq!(moved.pop(), Some(fragment.color), "moved end color");
                }
                _ => {}
            }
            assert!(containers >= 0, "container closed before opened");
            assert!(groups >= 0, "fragment group closed before opened");
        }
        assert_eq!(containers, 0, "unbalanced containers");
        assert_eq!(groups, 0, "unbalanced fragment groups");
        assert!(moved.is_empty(), "unclosed moved block");
    }

    /// No two adjacent fragments may share kind and color with non-empty
    /// text; the emitter merges those.
    pub fn assert_merged(fragments: &[Fragment]) {
        for pair in fragments.windows(2) {
            assert!(
                pair[0].kind != pair[1].kind
                    || pair[0].color != pair[1].color
                    || pair[0].text.is_empty()
                    || pair[1].text.is_empty(),
                "unmerged adjacent fragments: {pair:?}"
            );
        }
    }

    pub fn kinds(fragments: &[Fragment]) -> Vec<FragmentKind> {
        fragments.iter().map(|f| f.kind).collect()
    }

    pub fn texts(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

use harness::{assert_balanced, assert_merged, kinds, texts};

fn full_diff_config() -> DiffConfig {
    DiffConfig {
        full_diff: true,
        unit_testing: true,
        ..DiffConfig::default()
    }
}

#[test]
fn identical_versions_give_the_trivial_stream() {
    let fragments = diff("abc", "abc");
    assert_eq!(
        kinds(&fragments),
        vec![
            FragmentKind::ContainerStart,
            FragmentKind::FragmentStart,
            FragmentKind::Same,
            FragmentKind::FragmentEnd,
            FragmentKind::ContainerEnd,
        ]
    );
    assert!(fragments.iter().all(|f| f.text.is_empty()));
}

#[test]
fn inserted_word_splits_the_unchanged_text() {
    let fragments = diff("hello world", "hello brave world");
    assert_eq!(
        kinds(&fragments),
        vec![
            FragmentKind::ContainerStart,
            FragmentKind::FragmentStart,
            FragmentKind::Same,
            FragmentKind::Insertion,
            FragmentKind::Same,
            FragmentKind::FragmentEnd,
            FragmentKind::ContainerEnd,
        ]
    );
    assert_eq!(texts(&fragments), vec!["", "", "hello ", "brave ", "world", "", ""]);
    assert!(fragments.iter().all(|f| f.color == 0));
}

#[test]
fn deleted_word_splits_the_unchanged_text() {
    let fragments = diff("hello brave world", "hello world");
    assert_eq!(
        texts(&fragments),
        vec!["", "", "hello ", "brave ", "world", "", ""]
    );
    assert_eq!(fragments[3].kind, FragmentKind::Deletion);
}

#[test]
fn changed_paragraph_becomes_deletion_and_insertion() {
    let fragments = diff("para1\n\npara2", "para1\n\nPARA2");
    assert_eq!(
        kinds(&fragments),
        vec![
            FragmentKind::ContainerStart,
            FragmentKind::FragmentStart,
            FragmentKind::Same,
            FragmentKind::Deletion,
            FragmentKind::Insertion,
            FragmentKind::FragmentEnd,
            FragmentKind::ContainerEnd,
        ]
    );
    assert_eq!(
        texts(&fragments),
        vec!["", "", "para1\n\n", "para2", "PARA2", "", ""]
    );
}

#[test]
fn separated_word_refines_to_characters() {
    // One word became three tokens: the gap qualifies for character
    // refinement and the shared flanks stay unchanged.
    let fragments = diff("cat", "c-at");
    assert_eq!(texts(&fragments), vec!["", "", "c", "-", "at", "", ""]);
    assert_eq!(fragments[3].kind, FragmentKind::Insertion);
}

#[test]
fn reversed_blocks_are_detected_as_moves() {
    let fragments = diff("A B C", "C B A");

    let moved_colors: Vec<u32> = fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::MovedStart(_)))
        .map(|f| f.color)
        .collect();
    assert!(moved_colors.len() >= 2, "expected moved blocks: {fragments:?}");

    // Colors are distinct and counted from one.
    let mut unique_colors = moved_colors.clone();
    unique_colors.sort();
    unique_colors.dedup();
    assert_eq!(unique_colors.len(), moved_colors.len());
    assert!(unique_colors.iter().all(|&c| c >= 1));

    // Every moved block has a mark with the same color.
    for color in &moved_colors {
        assert!(
            fragments
                .iter()
                .any(|f| matches!(f.kind, FragmentKind::Mark(_)) && f.color == *color),
            "missing mark for color {color}"
        );
    }

    assert_balanced(&fragments);
    assert_eq!(rebuild_version(&fragments, Version::New), "C B A");
    assert_eq!(rebuild_version(&fragments, Version::Old), "A B C");
}

#[test]
fn block_moved_to_the_front_keeps_both_projections() {
    let old = "first second third fourth. end of text";
    let new = "end of text first second third fourth.";
    let fragments = diff(old, new);

    assert!(fragments
        .iter()
        .any(|f| matches!(f.kind, FragmentKind::MovedStart(_))));
    assert!(fragments.iter().any(|f| matches!(f.kind, FragmentKind::Mark(_))));
    assert_balanced(&fragments);
    assert_eq!(rebuild_version(&fragments, Version::New), new);
    assert_eq!(rebuild_version(&fragments, Version::Old), old);
}

#[test]
fn empty_old_version_is_one_insertion() {
    let fragments = diff("", "abc");
    assert_eq!(
        kinds(&fragments),
        vec![
            FragmentKind::ContainerStart,
            FragmentKind::FragmentStart,
            FragmentKind::Insertion,
            FragmentKind::FragmentEnd,
            FragmentKind::ContainerEnd,
        ]
    );
    assert_eq!(fragments[2].text, "abc");
}

#[test]
fn empty_new_version_is_one_deletion() {
    let fragments = diff("abc", "");
    assert_eq!(fragments[2].kind, FragmentKind::Deletion);
    assert_eq!(fragments[2].text, "abc");
}

#[test]
fn matching_trailing_newlines_are_stripped() {
    let fragments = diff("a\n", "b\n");
    assert_eq!(rebuild_version(&fragments, Version::Old), "a");
    assert_eq!(rebuild_version(&fragments, Version::New), "b");
}

#[test_case("hello world", "hello brave world" ; "insertion")]
#[test_case("hello brave world", "hello world" ; "deletion")]
#[test_case("A B C", "C B A" ; "reversal")]
#[test_case("cat", "c-a-t" ; "word separated by dashes")]
#[test_case("cat", "c-at" ; "word separated once")]
#[test_case("para1\n\npara2", "para1\n\nPARA2" ; "paragraph case change")]
#[test_case("", "abc" ; "empty old")]
#[test_case("abc", "" ; "empty new")]
#[test_case("first second third fourth. end of text",
            "end of text first second third fourth." ; "block move")]
#[test_case("caffè latte größer", "caffè macchiato größer" ; "unicode words")]
#[test_case("== Heading ==\nSome [[link|text]] here.\n\nNext paragraph with '''bold''' words.",
            "== Heading ==\nSome [[link|text]] there.\n\nInserted paragraph.\n\nNext paragraph with '''bold''' words."
            ; "wiki markup")]
fn fragment_stream_reassembles_both_versions(old: &str, new: &str) {
    let mut differ = Differ::new(full_diff_config()).unwrap();
    let fragments = differ.diff(old, new);

    assert!(!differ.error(), "consistency self-test failed");
    assert_balanced(&fragments);
    assert_merged(&fragments);
    assert_eq!(rebuild_version(&fragments, Version::New), new);
    assert_eq!(rebuild_version(&fragments, Version::Old), old);
}

#[test]
fn diffing_is_deterministic() {
    let old = "one two three four five. six seven eight nine ten.";
    let new = "six seven eight nine ten. one two three four five.";
    let first = diff(old, new);
    let second = diff(old, new);
    assert_eq!(first, second);
}

#[test]
fn an_engine_value_is_reusable() {
    let mut differ = Differ::new(full_diff_config()).unwrap();
    let first = differ.diff("a b c", "a x c");
    let again = differ.diff("a b c", "a x c");
    assert_eq!(first, again);

    let other = differ.diff("unrelated", "unrelated");
    assert_eq!(other.len(), 5);
}

#[test]
fn fragments_serialize_to_json_and_back() {
    let fragments = diff("hello world", "hello brave world");
    let json = serde_json::to_string(&fragments).unwrap();
    let back: Vec<Fragment> = serde_json::from_str(&json).unwrap();
    assert_eq!(fragments, back);
}

#[test]
fn disabled_char_diff_keeps_whole_words() {
    let config = DiffConfig {
        char_diff: false,
        full_diff: true,
        unit_testing: true,
        ..DiffConfig::default()
    };
    let mut differ = Differ::new(config).unwrap();
    let fragments = differ.diff("cat", "c-at");
    assert!(!differ.error());

    // Without character refinement the whole word is replaced.
    assert_eq!(
        kinds(&fragments)[2..5],
        [
            FragmentKind::Deletion,
            FragmentKind::Insertion,
            FragmentKind::FragmentEnd
        ]
    );
    assert_eq!(rebuild_version(&fragments, Version::Old), "cat");
    assert_eq!(rebuild_version(&fragments, Version::New), "c-at");
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    let config = DiffConfig {
        recursion_max: 0,
        ..DiffConfig::default()
    };
    assert!(Differ::new(config).is_err());
}
