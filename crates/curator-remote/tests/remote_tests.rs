use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use curator_core::traits::{KeywordBackend, QueryClassifier, RelevanceClassifier};
use curator_core::types::{FeedbackExample, FetchedContent, ResourceKind, Strategy, Vote};
use curator_remote::relevance::{system_prompt, user_message, MAX_CONTENT_CHARS};
use curator_remote::{
    kind_from_url, parse_page, ChatModel, LlmKeywordExtractor, LlmQueryClassifier, LlmRelevanceClassifier,
};

/// Replies with a canned answer and records what it was asked.
struct ScriptedChat {
    reply: String,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), seen: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
        self.seen.lock().unwrap().push((system.to_string(), user.to_string()));
        Ok(self.reply.clone())
    }
}

fn page(content: &str) -> FetchedContent {
    FetchedContent {
        url: "https://blog.example.com/agents".to_string(),
        title: "Agents".to_string(),
        content: content.to_string(),
        raw_markup: None,
        author: Some("Grace".to_string()),
        published_at: None,
        kind: ResourceKind::Article,
    }
}

#[tokio::test]
async fn classifier_parses_fenced_reply() {
    let chat = ScriptedChat::new("```json\n{\"strategy\": \"Graph\", \"reasoning\": \"relations\"}\n```");
    let classifier = LlmQueryClassifier::new(chat.clone());
    let c = classifier.classify("Tools compatible with LangChain").await.unwrap();
    assert_eq!(c.strategy, Strategy::Graph);
    assert_eq!(c.rationale.as_deref(), Some("relations"));
    assert!(chat.seen.lock().unwrap()[0].1.contains("Tools compatible with LangChain"));
}

#[tokio::test]
async fn classifier_maps_hybrid_and_rejects_unknown() {
    let hybrid = LlmQueryClassifier::new(ScriptedChat::new("{\"strategy\": \"hybrid\"}"));
    assert_eq!(hybrid.classify("q").await.unwrap().strategy, Strategy::Lexical);

    let unknown = LlmQueryClassifier::new(ScriptedChat::new("{\"strategy\": \"telepathy\"}"));
    assert!(unknown.classify("q").await.is_err());

    let garbage = LlmQueryClassifier::new(ScriptedChat::new("I think graph"));
    assert!(garbage.classify("q").await.is_err());
}

#[tokio::test]
async fn keyword_extractor_defaults_missing_fields() {
    let extractor = LlmKeywordExtractor::new(ScriptedChat::new("{\"entity_keywords\": [\"LangChain\"]}"));
    let set = extractor.extract("LangChain agents").await.unwrap();
    assert_eq!(set.entity_keywords, vec!["LangChain"]);
    assert!(set.topic_keywords.is_empty());
}

#[tokio::test]
async fn relevance_reply_becomes_analysis() {
    let reply = r#"{"is_ai_related": true, "summary": "How to build agents", "concepts": ["Agents"],
                    "tech_stack": ["Python"], "author": "", "recommended_reason": "practical"}"#;
    let classifier = LlmRelevanceClassifier::new(ScriptedChat::new(reply));
    let analysis = classifier.classify(&page("body"), &[]).await.unwrap();
    assert!(analysis.relevant);
    assert_eq!(analysis.summary.as_deref(), Some("How to build agents"));
    assert_eq!(analysis.author, None, "blank author is treated as absent");
    assert_eq!(analysis.concepts, vec!["Agents"]);

    let rejecting = LlmRelevanceClassifier::new(ScriptedChat::new("{\"relevant\": false, \"summary\": \"x\"}"));
    let analysis = rejecting.classify(&page("body"), &[]).await.unwrap();
    assert!(!analysis.relevant);
    assert!(analysis.summary.is_none());
}

#[test]
fn prompt_includes_feedback_examples_by_vote() {
    let examples = vec![
        FeedbackExample { title: "Great RAG guide".into(), reason: "hands-on".into(), vote: Vote::Like },
        FeedbackExample { title: "CUDA kernels".into(), reason: "too low level".into(), vote: Vote::Dislike },
    ];
    let prompt = system_prompt(&examples);
    let pos = prompt.find("Positive examples").unwrap();
    let neg = prompt.find("Negative examples").unwrap();
    assert!(pos < neg);
    assert!(prompt.contains("- Title: Great RAG guide\n  User reason: hands-on"));
    assert!(prompt[neg..].contains("CUDA kernels"));

    assert!(!system_prompt(&[]).contains("User preferences"));
}

#[test]
fn user_message_truncates_content() {
    let long = "z".repeat(MAX_CONTENT_CHARS + 500);
    let msg = user_message(&page(&long));
    assert!(msg.starts_with("Title: Agents\nExtracted author: Grace\n"));
    assert_eq!(msg.matches('z').count(), MAX_CONTENT_CHARS);
}

#[test]
fn page_metadata_is_extracted() {
    let html = r#"<html><head><title> Fallback title </title>
        <meta property="og:title" content="Building Agents">
        <meta name="author" content="Grace Hopper">
        <meta property="article:published_time" content="2026-10-01T08:00:00Z">
        <script>var tracking = 1;</script></head>
        <body><nav>Home About</nav><h1>Building Agents</h1><p>Plan,   act, observe.</p></body></html>"#;
    let fetched = parse_page("https://www.example.com/posts/agents", html);
    assert_eq!(fetched.title, "Building Agents");
    assert_eq!(fetched.author.as_deref(), Some("Grace Hopper"));
    assert_eq!(fetched.published_at.as_deref(), Some("2026-10-01T08:00:00Z"));
    assert_eq!(fetched.content, "Building Agents\nPlan, act, observe.");
    assert_eq!(fetched.kind, ResourceKind::Article);
    assert!(fetched.raw_markup.is_some());
}

#[test]
fn time_element_and_title_fallbacks() {
    let html = r#"<html><head><title>Plain</title></head><body><time datetime="2026-09-30">Sep 30</time></body></html>"#;
    let fetched = parse_page("https://example.com/x", html);
    assert_eq!(fetched.title, "Plain");
    assert_eq!(fetched.published_at.as_deref(), Some("2026-09-30"));
    assert!(fetched.author.is_none());
}

#[test]
fn kind_is_inferred_from_host() {
    assert_eq!(kind_from_url("https://github.com/tokio-rs/tokio"), ResourceKind::Code);
    assert_eq!(kind_from_url("https://www.youtube.com/watch?v=1"), ResourceKind::Video);
    assert_eq!(kind_from_url("https://x.com/someone/status/1"), ResourceKind::Social);
    assert_eq!(kind_from_url("https://news.ycombinator.com/item?id=1"), ResourceKind::Forum);
    assert_eq!(kind_from_url("https://discourse.example.org/t/1"), ResourceKind::Forum);
    assert_eq!(kind_from_url("https://blog.example.com/post"), ResourceKind::Article);
    assert_eq!(kind_from_url("not a url"), ResourceKind::Article);
}
