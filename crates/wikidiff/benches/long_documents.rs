use criterion::{criterion_group, criterion_main, Criterion};

use wikidiff::{DiffConfig, Differ};

/// Build a wiki-flavored document of `sections` sections with distinct
/// content, so the diff has plenty of unique anchors to work with.
fn build_document(sections: usize) -> String {
    let mut text = String::new();
    for section in 0..sections {
        text.push_str(&format!("== Section {section} ==\n"));
        for line in 0..8 {
            text.push_str(&format!(
                "Paragraph {section}-{line} mentions [[Article {section}]] and keeps \
                 some prose around template {{{{cite|id={section}-{line}}}}} for bulk.\n"
            ));
        }
        text.push('\n');
    }
    text
}

/// Edit the document: change a line in the middle, move one section to the
/// end, and insert a fresh paragraph.
fn edit_document(original: &str) -> String {
    let mut edited = original.replace(
        "Paragraph 12-3 mentions",
        "Paragraph 12-3 no longer mentions",
    );
    if let Some(start) = edited.find("== Section 3 ==") {
        if let Some(end) = edited[start..].find("\n\n") {
            let section: String = edited[start..start + end + 2].to_string();
            edited.replace_range(start..start + end + 2, "");
            edited.push_str(&section);
        }
    }
    edited.push_str("A closing remark that only the new version carries.\n");
    edited
}

fn long_documents(c: &mut Criterion) {
    let old = build_document(25);
    let new = edit_document(&old);

    let mut group = c.benchmark_group("long documents");
    group.bench_function("clipped", |b| {
        let mut differ = Differ::default();
        b.iter(|| differ.diff(&old, &new))
    });
    group.bench_function("full", |b| {
        let config = DiffConfig {
            full_diff: true,
            ..DiffConfig::default()
        };
        let mut differ = Differ::new(config).expect("valid config");
        b.iter(|| differ.diff(&old, &new))
    });
    group.finish();
}

fn short_texts(c: &mut Criterion) {
    c.bench_function("short inline change", |b| {
        let mut differ = Differ::default();
        b.iter(|| {
            differ.diff(
                "The quick brown fox jumps over the lazy dog.",
                "The quick brown cat leaps over the lazy dog.",
            )
        })
    });
}

criterion_group!(benches, long_documents, short_texts);
criterion_main!(benches);
