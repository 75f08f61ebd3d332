use std::collections::BTreeSet;

use chrono::Utc;
use curator_core::chunker::{split_sections, StructuralChunker, TextSplitter};
use curator_core::config::ChunkingConfig;
use curator_core::normalizer::NormalizedContent;
use curator_core::types::{Record, ResourceKind};

fn record(summary: &str) -> Record {
    Record {
        id: "rec-1".to_string(),
        url: "https://example.com/post".to_string(),
        kind: ResourceKind::Article,
        title: "Agents in Practice".to_string(),
        summary: summary.to_string(),
        author: "Unknown".to_string(),
        published_at: Utc::now(),
        concepts: BTreeSet::new(),
        tech_stack: BTreeSet::new(),
        recommended_reason: None,
    }
}

fn body_of(text: &str) -> &str {
    text.split("\nContent:\n").nth(1).unwrap_or_default()
}

#[test]
fn sections_follow_heading_hierarchy() {
    let md = "# A\nalpha\n## B\nbravo\n### C\ncharlie\n## D\ndelta\n# E\necho";
    let sections = split_sections(md);
    let paths: Vec<Vec<&str>> = sections
        .iter()
        .map(|s| s.path.iter().map(String::as_str).collect())
        .collect();
    assert_eq!(
        paths,
        vec![vec!["A"], vec!["A", "B"], vec!["A", "B", "C"], vec!["A", "D"], vec!["E"]]
    );
    assert_eq!(sections[2].body, "charlie");
}

#[test]
fn headings_inside_code_fences_are_content() {
    let md = "# Setup\n```bash\n# install deps\npip install x\n```\nafter";
    let sections = split_sections(md);
    assert_eq!(sections.len(), 1);
    assert!(sections[0].body.contains("# install deps"));
    assert!(sections[0].body.ends_with("after"));
}

#[test]
fn text_before_first_heading_has_empty_path() {
    let sections = split_sections("preamble\n# Title\nbody");
    assert_eq!(sections[0].path, Vec::<String>::new());
    assert_eq!(sections[0].body, "preamble");
    assert_eq!(sections[1].path, vec!["Title".to_string()]);
}

#[test]
fn summary_chunk_comes_first_then_sections() {
    let chunker = StructuralChunker::new(ChunkingConfig::default());
    let md = format!("# Intro\nShort text.\n## Details\n{}", "x".repeat(1500));
    let chunks = chunker.chunk(&record("A practical look."), &NormalizedContent::structured(md));

    assert_eq!(chunks.len(), 4, "summary, intro, and two pieces of details");
    assert_eq!(body_of(&chunks[0].text), "Summary: A practical look.");
    assert!(chunks[0].section_path.is_empty());

    assert_eq!(chunks[1].section_path, vec!["Intro".to_string()]);
    assert_eq!(body_of(&chunks[1].text), "Short text.");

    let details: Vec<&str> = chunks[2..].iter().map(|c| body_of(&c.text)).collect();
    assert_eq!(details[0].len(), 1000);
    assert_eq!(details[1].len(), 700);
    for c in &chunks[2..] {
        assert_eq!(c.section_path, vec!["Intro".to_string(), "Details".to_string()]);
        assert!(c.text.contains("Section Path: Intro > Details"));
    }
}

#[test]
fn every_chunk_carries_title_and_ordinal_ids() {
    let chunker = StructuralChunker::new(ChunkingConfig::default());
    let md = "# One\nfirst\n# Two\nsecond";
    let chunks = chunker.chunk(&record("s"), &NormalizedContent::structured(md));
    for (i, chunk) in chunks.iter().enumerate() {
        assert!(chunk.text.contains("Agents in Practice"));
        assert_eq!(chunk.ordinal, i);
        assert_eq!(chunk.id, format!("rec-1:{i}"));
        assert_eq!(chunk.record_id, "rec-1");
    }
}

#[test]
fn long_summary_is_truncated_in_prefix() {
    let chunker = StructuralChunker::new(ChunkingConfig::default());
    let summary = "s".repeat(300);
    let chunks = chunker.chunk(&record(&summary), &NormalizedContent::plain("body text"));
    let expected = format!("Document Summary: {}...\n", "s".repeat(200));
    assert!(chunks[1].text.contains(&expected));
}

#[test]
fn empty_content_yields_only_summary_chunk() {
    let chunker = StructuralChunker::new(ChunkingConfig::default());
    let chunks = chunker.chunk(&record("Only a summary."), &NormalizedContent::plain("   "));
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].ordinal, 0);

    let none = chunker.chunk(&record(""), &NormalizedContent::plain(""));
    assert!(none.is_empty());
}

#[test]
fn section_at_ceiling_is_not_split() {
    let chunker = StructuralChunker::new(ChunkingConfig::default());
    let md = format!("# Exact\n{}", "y".repeat(1000));
    let chunks = chunker.chunk(&record(""), &NormalizedContent::structured(md));
    assert_eq!(chunks.len(), 1);
    assert_eq!(body_of(&chunks[0].text).len(), 1000);
}

#[test]
fn plain_text_pieces_respect_ceiling_and_overlap() {
    let splitter = TextSplitter::new(1000, 200);
    let text = (0..400).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
    let pieces = splitter.split(&text);
    assert!(pieces.len() > 1);
    for piece in &pieces {
        assert!(piece.chars().count() <= 1000);
    }
    for pair in pieces.windows(2) {
        let last_word = pair[0].split(' ').last().unwrap();
        assert!(pair[1].contains(last_word), "consecutive pieces share an overlap");
    }
}
