use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::debug;

use curator_core::traits::ContentFetcher;
use curator_core::types::{FetchedContent, ResourceKind};

const SKIPPED_TAGS: [&str; 8] = ["script", "style", "noscript", "template", "svg", "nav", "head", "iframe"];

/// Generic page fetcher: GET, then pull title, author, publish date and the
/// visible text out of the HTML.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("curator/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build fetch HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let resp = self.client.get(url).send().await.with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        let is_html = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("html"));
        let body = resp.text().await.with_context(|| format!("reading body of {url}"))?;
        debug!(url, bytes = body.len(), is_html, "fetched");
        if is_html {
            return Ok(parse_page(url, &body));
        }
        Ok(FetchedContent {
            url: url.to_string(),
            title: title_from_path(url),
            content: body,
            raw_markup: None,
            author: None,
            published_at: None,
            kind: kind_from_url(url),
        })
    }
}

pub fn parse_page(url: &str, html: &str) -> FetchedContent {
    let document = Html::parse_document(html);
    let title = first_attr(&document, r#"meta[property="og:title"]"#, "content")
        .or_else(|| first_text(&document, "title"))
        .unwrap_or_else(|| title_from_path(url));
    let author = first_attr(&document, r#"meta[name="author"]"#, "content")
        .or_else(|| first_attr(&document, r#"meta[property="article:author"]"#, "content"));
    let published_at = first_attr(&document, r#"meta[property="article:published_time"]"#, "content")
        .or_else(|| first_attr(&document, "time[datetime]", "datetime"));
    FetchedContent {
        url: url.to_string(),
        title,
        content: visible_text(&document),
        raw_markup: Some(html.to_string()),
        author,
        published_at,
        kind: kind_from_url(url),
    }
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let el = document.select(&selector).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Text nodes outside scripts, styles and navigation, one run per line.
pub fn visible_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());
    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|el| SKIPPED_TAGS.contains(&el.name()));
        if hidden {
            continue;
        }
        let run = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !run.is_empty() {
            lines.push(run);
        }
    }
    lines.join("\n")
}

pub fn kind_from_url(url: &str) -> ResourceKind {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    match host {
        "github.com" | "gitlab.com" | "raw.githubusercontent.com" => ResourceKind::Code,
        "youtube.com" | "youtu.be" | "m.youtube.com" | "vimeo.com" => ResourceKind::Video,
        "x.com" | "twitter.com" | "mobile.twitter.com" => ResourceKind::Social,
        "reddit.com" | "old.reddit.com" | "news.ycombinator.com" => ResourceKind::Forum,
        h if h.contains("discourse") || h.starts_with("forum.") || h.starts_with("discuss.") => ResourceKind::Forum,
        _ => ResourceKind::Article,
    }
}

fn title_from_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| url.to_string())
}
