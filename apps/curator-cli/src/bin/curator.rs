use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use curator_core::config::{expand_path, Config, Settings};
use curator_core::traits::{Embedder, GraphStore, StructuredStore, VectorStore};
use curator_core::types::Vote;
use curator_embed::default_embedder;
use curator_graph::{index_record, MemoryGraphStore};
use curator_hybrid::{KeywordExtractor, QueryRouter, RetrievalEngine};
use curator_ingest::{IngestOutcome, IngestionCoordinator, RejectReason};
use curator_remote::{ChatModel, HttpFetcher, LlmKeywordExtractor, LlmQueryClassifier, LlmRelevanceClassifier, OpenAiChat};
use curator_store::SqliteStore;
use curator_vector::LanceVectorStore;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const PREVIEW_CHARS: usize = 240;

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  curator ingest <url>...");
    eprintln!("  curator query \"<text>\" [limit]");
    eprintln!("  curator feedback <record_id> like|dislike [reason]");
    std::process::exit(2);
}

struct Runtime {
    settings: Settings,
    store: Arc<dyn StructuredStore>,
    graph: Arc<dyn GraphStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chat: Option<Arc<dyn ChatModel>>,
}

impl Runtime {
    async fn open(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(SqliteStore::open(&expand_path(&settings.data.sqlite_path))?);
        let embedder = default_embedder(&settings.embedding)?;
        let vectors = LanceVectorStore::open(
            &expand_path(&settings.data.lancedb_dir),
            &settings.data.chunks_table,
            embedder.dim(),
        )
        .await?;

        // The entity graph lives in memory; rebuild it from the canonical records.
        let graph = Arc::new(MemoryGraphStore::new());
        let records = store.all().await?;
        for record in &records {
            index_record(graph.as_ref(), record).await?;
        }
        info!(records = records.len(), nodes = graph.node_count(), "graph rebuilt");

        let chat: Option<Arc<dyn ChatModel>> = match OpenAiChat::new(&settings.llm) {
            Ok(chat) => Some(Arc::new(chat)),
            Err(e) => {
                warn!(error = %e, "LLM disabled, falling back to heuristics");
                None
            }
        };
        Ok(Self { settings, store, graph, vectors: Arc::new(vectors), embedder, chat })
    }

    fn coordinator(&self) -> anyhow::Result<IngestionCoordinator> {
        let fetcher = Arc::new(HttpFetcher::new(FETCH_TIMEOUT)?);
        let mut coordinator = IngestionCoordinator::new(
            fetcher,
            Arc::clone(&self.store),
            self.settings.chunking.clone(),
            self.settings.ingestion.clone(),
        )
        .with_graph(Arc::clone(&self.graph))
        .with_vectors(Arc::clone(&self.vectors), Arc::clone(&self.embedder));
        if let Some(chat) = self.chat.as_ref() {
            coordinator = coordinator.with_classifier(Arc::new(LlmRelevanceClassifier::new(Arc::clone(chat))));
        }
        Ok(coordinator)
    }

    fn engine(&self) -> anyhow::Result<RetrievalEngine> {
        let retrieval = &self.settings.retrieval;
        let routing_timeout = Duration::from_millis(retrieval.routing_timeout_ms);
        let (router, keywords) = match self.chat.as_ref() {
            Some(chat) => (
                QueryRouter::new(Some(Arc::new(LlmQueryClassifier::new(Arc::clone(chat)))), Some(Arc::clone(&self.graph)))
                    .with_timeout(routing_timeout),
                KeywordExtractor::new(
                    Arc::new(LlmKeywordExtractor::new(Arc::clone(chat))),
                    Duration::from_millis(retrieval.keyword_timeout_ms),
                ),
            ),
            None => (
                QueryRouter::new(None, Some(Arc::clone(&self.graph))).with_timeout(routing_timeout),
                KeywordExtractor::naive(),
            ),
        };
        RetrievalEngine::new(router, keywords, Arc::clone(&self.store), retrieval).with_standard_retrievers(
            Arc::clone(&self.graph),
            Arc::clone(&self.vectors),
            Arc::clone(&self.embedder),
            retrieval,
        )
    }
}

async fn ingest(rt: &Runtime, urls: Vec<String>) -> anyhow::Result<()> {
    let coordinator = rt.coordinator()?;
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?.progress_chars("##-"));
    let results = coordinator
        .ingest_many_with(&urls, |url, _| {
            pb.set_message(url.to_string());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    let mut failed = 0usize;
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(IngestOutcome::Ingested(report)) => println!(
                "✅ {url}\n   record={} chunks={} graph={} vector={}",
                report.record_id, report.chunks, report.graph_indexed, report.vector_indexed
            ),
            Ok(IngestOutcome::AlreadyIngested) => println!("⏭️  {url} (already ingested)"),
            Ok(IngestOutcome::Rejected(RejectReason::Stale { published })) => {
                println!("🗓️  {url} rejected: published {}", published.format("%Y-%m-%d"))
            }
            Ok(IngestOutcome::Rejected(RejectReason::NotRelevant)) => println!("🚫 {url} rejected: not relevant"),
            Err(e) => {
                failed += 1;
                println!("❌ {url}: {e}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} urls failed", urls.len());
    }
    Ok(())
}

async fn query(rt: &Runtime, text: &str, limit: usize) -> anyhow::Result<()> {
    let engine = rt.engine()?;
    let results = engine.retrieve(text, limit).await?;
    println!("🔍 {} results for \"{}\"", results.len(), text);
    for (i, r) in results.iter().enumerate() {
        println!(
            "\n  {}. [{}] {}  score={:.4}",
            i + 1,
            r.origin,
            r.title.as_deref().unwrap_or("(untitled)"),
            r.score
        );
        if let Some(url) = r.url.as_deref() {
            println!("     🔗 {url}");
        }
        let preview: String = r.text.chars().take(PREVIEW_CHARS).collect::<String>().replace('\n', " ");
        println!("     📝 {preview}");
    }
    Ok(())
}

async fn feedback(rt: &Runtime, record_id: &str, vote: &str, reason: Option<&str>) -> anyhow::Result<()> {
    let vote = match vote {
        "like" => Vote::Like,
        "dislike" => Vote::Dislike,
        other => bail!("vote must be like or dislike, got '{other}'"),
    };
    rt.store.add_feedback(record_id, vote, reason).await?;
    println!("📝 recorded {} for {record_id}", vote.as_str());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else { usage() };
    let settings = Config::load()
        .and_then(|c| c.settings())
        .context("loading configuration")?;

    match command.as_str() {
        "ingest" if args.len() > 1 => {
            let rt = Runtime::open(settings).await?;
            ingest(&rt, args[1..].to_vec()).await
        }
        "query" if args.len() > 1 => {
            let limit = match args.get(2) {
                Some(raw) => raw.parse::<usize>().with_context(|| format!("limit must be a number, got '{raw}'"))?,
                None => settings.retrieval.default_limit,
            };
            let rt = Runtime::open(settings).await?;
            query(&rt, &args[1], limit).await
        }
        "feedback" if args.len() > 2 => {
            let rt = Runtime::open(settings).await?;
            let reason = (args.len() > 3).then(|| args[3..].join(" "));
            feedback(&rt, &args[1], &args[2], reason.as_deref()).await
        }
        _ => usage(),
    }
}
