use curator_core::normalizer::{html_to_markdown, normalize, ContentFormat};
use curator_core::types::{FetchedContent, ResourceKind};

fn fetched(url: &str, kind: ResourceKind, content: &str, markup: Option<&str>) -> FetchedContent {
    FetchedContent {
        url: url.to_string(),
        title: "t".to_string(),
        content: content.to_string(),
        raw_markup: markup.map(str::to_string),
        author: None,
        published_at: None,
        kind,
    }
}

#[test]
fn code_hosts_and_readmes_are_structured_as_is() {
    let code = fetched("https://github.com/a/b", ResourceKind::Code, "plain words", None);
    let out = normalize(&code, 100);
    assert_eq!(out.format, ContentFormat::Structured);
    assert_eq!(out.text, "plain words");

    let readme = fetched("https://host/x/README.md", ResourceKind::Article, "words", None);
    assert_eq!(normalize(&readme, 100).format, ContentFormat::Structured);

    let heading = fetched("https://host/post", ResourceKind::Article, "# Title\nbody", None);
    assert_eq!(normalize(&heading, 100).format, ContentFormat::Structured);
}

#[test]
fn substantial_markup_is_converted() {
    let html = format!(
        "<html><body><h1>Guide</h1><p>{}</p><h2>Usage</h2><p>Run it.</p></body></html>",
        "Intro words. ".repeat(10)
    );
    let page = fetched("https://host/post", ResourceKind::Article, "Guide Intro", Some(&html));
    let out = normalize(&page, 100);
    assert_eq!(out.format, ContentFormat::Structured);
    assert!(out.text.starts_with("# Guide"));
    assert!(out.text.contains("## Usage\n\nRun it."));
}

#[test]
fn short_markup_falls_back_to_plain() {
    let page = fetched("https://host/post", ResourceKind::Article, "just text", Some("<p>hi</p>"));
    let out = normalize(&page, 100);
    assert_eq!(out.format, ContentFormat::Plain);
    assert_eq!(out.text, "just text");
}

#[test]
fn conversion_keeps_links_and_drops_images() {
    let md = html_to_markdown(
        r#"<body><p>See <a href="https://docs.rs">the docs</a> <img src="x.png" alt="pic"> now.</p></body>"#,
    );
    assert_eq!(md, "See [the docs](https://docs.rs) now.");
}

#[test]
fn conversion_drops_scripts_and_renders_lists() {
    let md = html_to_markdown(
        "<body><script>var x = 1;</script><p>Intro</p><ul><li>one</li><li>two</li></ul><pre>let a = 1;\nlet b = 2;</pre></body>",
    );
    assert_eq!(md, "Intro\n\n- one\n- two\n\n```\nlet a = 1;\nlet b = 2;\n```");
}
