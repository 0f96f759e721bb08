use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use localrag_chat::{AnswerStreamer, OllamaChat, PromptTemplate};
use localrag_core::config::Settings;
use localrag_core::error::Error;
use localrag_core::{ChunkSplitter, Query};
use localrag_embed::build_embedder;
use localrag_pipeline::Pipeline;
use localrag_source::build_source;
use localrag_vector::DocumentIndex;

fn parse_query(settings: &Settings) -> String {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: localrag [query]\nIngests the configured pages, retrieves the best passage and streams a grounded answer.");
        std::process::exit(0);
    }
    if args.is_empty() { settings.query.clone() } else { args.join(" ") }
}

fn spinner(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load().context("loading configuration")?;
    let query = Query::new(parse_query(&settings));

    let embedder = build_embedder(&settings.embedding).context("building embedder")?;
    let store = settings.store_path();
    std::fs::create_dir_all(&store).with_context(|| format!("creating store at {}", store.display()))?;
    let index = DocumentIndex::connect(&store.to_string_lossy(), embedder).await?;
    let chat = Arc::new(OllamaChat::new(&settings.chat)?);
    tracing::info!(model = chat.model(), base_url = %settings.chat.base_url, "chat service configured");

    let pipeline = Pipeline::new(
        build_source(&settings.source)?,
        ChunkSplitter::new(settings.chunking.drop_if_blank),
        index,
        PromptTemplate::llama3(),
        AnswerStreamer::new(chat),
    );

    let collection = pipeline.reset(&settings.store.collection).await?;
    let pb = spinner(settings.pages.len() as u64);
    let mut units = 0;
    for page in &settings.pages {
        pb.set_message(format!("ingesting {}", page.title));
        units += pipeline.ingest_page(&collection, page).await?;
        pb.inc(1);
    }
    pb.finish_with_message(format!("{units} passages indexed"));

    let (top, stream) = pipeline.answer(&collection, &query, settings.search.limit).await?;
    tracing::info!(category = %top.unit.category, score = top.score, "answering with retrieved passage");

    let mut stdout = tokio::io::stdout();
    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    match stream.deliver(&mut stdout, cancel).await {
        Ok(summary) => {
            tracing::debug!(fragments = summary.fragments, "done");
            Ok(())
        }
        Err(Error::Cancelled) => {
            eprintln!();
            tracing::warn!("answer cancelled by user");
            Err(Error::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}
