//! Domain types shared by the ingestion pipeline and the retrieval engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::Error;

pub type RecordId = String;
pub type ChunkId = String;

/// Broad category of an ingested resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Code,
    Article,
    Video,
    Forum,
    Social,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Code => "Code",
            ResourceKind::Article => "Article",
            ResourceKind::Video => "Video",
            ResourceKind::Forum => "Forum",
            ResourceKind::Social => "Social",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(ResourceKind::Code),
            "article" => Ok(ResourceKind::Article),
            "video" => Ok(ResourceKind::Video),
            "forum" => Ok(ResourceKind::Forum),
            "social" => Ok(ResourceKind::Social),
            other => Err(Error::InvalidConfig(format!("unknown resource kind '{other}'"))),
        }
    }
}

/// Canonical persisted representation of one ingested content item.
///
/// `url` is the natural key: the structured store holds at most one record
/// per url.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub url: String,
    pub kind: ResourceKind,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub concepts: BTreeSet<String>,
    pub tech_stack: BTreeSet<String>,
    pub recommended_reason: Option<String>,
}

impl Record {
    /// Plain-text card used by retrievers that surface whole records.
    pub fn describe(&self) -> String {
        let mut out = format!("Title: {}\nSummary: {}", self.title, self.summary);
        if !self.concepts.is_empty() {
            out.push_str("\nConcepts: ");
            out.push_str(&join_set(&self.concepts));
        }
        if !self.tech_stack.is_empty() {
            out.push_str("\nTech: ");
            out.push_str(&join_set(&self.tech_stack));
        }
        if let Some(reason) = self.recommended_reason.as_deref().filter(|r| !r.is_empty()) {
            out.push_str("\nRecommended: ");
            out.push_str(reason);
        }
        out
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// A retrievable slice of a record's normalized content.
///
/// - `id`: `<record_id>:<ordinal>`, stable across re-indexing
/// - `section_path`: heading titles from outermost to innermost, possibly empty
/// - `text`: content prefixed with title, summary and section context
/// - `ordinal`: position within the parent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub record_id: RecordId,
    pub section_path: Vec<String>,
    pub text: String,
    pub ordinal: usize,
}

/// Indicates which retriever produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Lexical,
    Graph,
    Vector,
    Structured,
}

impl SourceKind {
    /// Priority order used by fusion; earlier lists win ties.
    pub const FUSION_ORDER: [SourceKind; 4] = [
        SourceKind::Lexical,
        SourceKind::Graph,
        SourceKind::Vector,
        SourceKind::Structured,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Lexical => "lexical",
            SourceKind::Graph => "graph",
            SourceKind::Vector => "vector",
            SourceKind::Structured => "structured",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient per-query hit. `score` is retriever-specific; fusion never
/// compares scores across retrievers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub source_record_id: Option<RecordId>,
    pub source: SourceKind,
    pub score: f32,
    pub origin: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub kind: Option<ResourceKind>,
}

impl RetrievalResult {
    pub fn new(source: SourceKind, text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            source_record_id: None,
            source,
            score,
            origin: source.as_str().to_string(),
            url: None,
            title: None,
            kind: None,
        }
    }

    /// Attach the canonical fields of `record`.
    pub fn with_record(mut self, record: &Record) -> Self {
        self.source_record_id = Some(record.id.clone());
        self.url = Some(record.url.clone());
        self.title = Some(record.title.clone());
        self.kind = Some(record.kind);
        self
    }

    pub fn with_record_id(mut self, id: impl Into<RecordId>) -> Self {
        self.source_record_id = Some(id.into());
        self
    }

    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Which optional retrievers a query activates. Structured and Vector are
/// always on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Baseline: Lexical + Structured + Vector. Classifiers may call it "hybrid".
    Lexical,
    Graph,
    Combined,
}

impl Strategy {
    pub const BASELINE: Strategy = Strategy::Lexical;

    /// Activated retrievers in fusion priority order.
    pub fn active_sources(&self) -> &'static [SourceKind] {
        match self {
            Strategy::Lexical => &[SourceKind::Lexical, SourceKind::Vector, SourceKind::Structured],
            Strategy::Graph => &[SourceKind::Graph, SourceKind::Vector, SourceKind::Structured],
            Strategy::Combined => &SourceKind::FUSION_ORDER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Lexical => "lexical",
            Strategy::Graph => "graph",
            Strategy::Combined => "combined",
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" | "hybrid" => Ok(Strategy::Lexical),
            "graph" => Ok(Strategy::Graph),
            "combined" => Ok(Strategy::Combined),
            other => Err(Error::Classification(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Output of a query classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub strategy: Strategy,
    pub rationale: Option<String>,
}

/// Query keywords split into concrete entities and abstract topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    #[serde(default)]
    pub entity_keywords: Vec<String>,
    #[serde(default)]
    pub topic_keywords: Vec<String>,
}

impl KeywordSet {
    /// Degraded extraction: both sets are the whitespace tokens of `query`.
    pub fn naive(query: &str) -> Self {
        let tokens: Vec<String> = query.split_whitespace().map(str::to_string).collect();
        Self { entity_keywords: tokens.clone(), topic_keywords: tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.entity_keywords.iter().chain(&self.topic_keywords).all(|k| k.trim().is_empty())
    }

    /// Entity keywords then topic keywords, case-insensitively deduplicated.
    pub fn all(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entity_keywords
            .iter()
            .chain(&self.topic_keywords)
            .map(|k| k.trim())
            .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
            .collect()
    }

    /// Original query followed by every extracted keyword.
    pub fn expanded_query(&self, query: &str) -> String {
        let mut parts = vec![query.trim()];
        parts.extend(self.all());
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

/// Raw output of a content fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub raw_markup: Option<String>,
    pub author: Option<String>,
    /// Publish date as found on the page; parsed by the ingestion gate.
    pub published_at: Option<String>,
    pub kind: ResourceKind,
}

/// Verdict of the relevance classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub relevant: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub recommended_reason: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl Analysis {
    pub fn rejected() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Like => "like",
            Vote::Dislike => "dislike",
        }
    }
}

/// A past user judgement used as a few-shot example for relevance analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackExample {
    pub title: String,
    pub reason: String,
    pub vote: Vote,
}

/// Result of inserting into a store with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityLabel {
    Resource,
    Concept,
    TechStack,
    Author,
}

/// Identity of a graph entity: resources are keyed by record id, everything
/// else by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub label: EntityLabel,
    pub key: String,
}

impl EntityKey {
    pub fn new(label: EntityLabel, key: impl Into<String>) -> Self {
        Self { label, key: key.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: EntityKey,
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    pub fn new(label: EntityLabel, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self { key: EntityKey::new(label, key), name: name.into(), properties: BTreeMap::new() }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Teaches,
    Uses,
    AuthoredBy,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Teaches => "TEACHES",
            RelationKind::Uses => "USES",
            RelationKind::AuthoredBy => "AUTHORED_BY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: EntityKey,
    pub to: EntityKey,
    pub kind: RelationKind,
}

/// Metadata stored next to each chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub record_id: RecordId,
    pub ordinal: usize,
    pub section_path: Vec<String>,
    pub text: String,
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: ChunkId,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// Nearest-neighbour hit; `score` is cosine similarity (1 - distance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: ChunkId,
    pub score: f32,
    pub payload: ChunkPayload,
}
