use std::env;
use std::fs;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docrag_core::chunker;
use docrag_core::config::{expand_path, Config};
use docrag_embed::embedder_from;
use docrag_engine::{OpenAiChat, RagEngine, DEFAULT_TEMPERATURE, DEFAULT_TOP_K};
use docrag_index::VectorStore;
use docrag_loader::DocumentLoader;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} <ingest|ask|stats|clear> [args...]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "ingest" => {
            let dir_override = args.first().map(|s| expand_path(s));
            ingest(&config, dir_override)?;
        }
        "ask" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: docrag ask \"<question>\"");
                std::process::exit(1)
            });
            ask(&config, &question)?;
        }
        "stats" => stats(&config)?,
        "clear" => clear(&config)?,
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn snapshot_paths(config: &Config) -> (PathBuf, PathBuf) {
    let dir: String = config.get_or("index.snapshot_dir", "data/index".to_string());
    let dir = expand_path(dir);
    (dir.join("vectors.bin"), dir.join("metadata.json"))
}

fn build_embedder(config: &Config) -> anyhow::Result<Box<dyn docrag_core::traits::Embedder>> {
    let model_dir = config
        .get::<String>("embedding.model_dir")
        .ok()
        .map(expand_path)
        .filter(|p| p.exists());
    embedder_from(model_dir.as_deref())
}

fn open_store(config: &Config) -> anyhow::Result<VectorStore> {
    let embedder = build_embedder(config)?;
    let mut store = VectorStore::new(embedder);
    let (vectors_path, metadata_path) = snapshot_paths(config);
    store.load(&vectors_path, &metadata_path)?;
    Ok(store)
}

fn ingest(config: &Config, dir_override: Option<PathBuf>) -> anyhow::Result<()> {
    let docs_dir = dir_override.unwrap_or_else(|| {
        expand_path(config.get_or("data.docs_dir", "documents".to_string()))
    });
    let chunk_size = config.get_or("chunking.chunk_size", 500usize);
    let chunk_overlap = config.get_or("chunking.chunk_overlap", 50usize);
    let boundary_window =
        config.get_or("chunking.boundary_window", chunker::DEFAULT_BOUNDARY_WINDOW);

    println!("Ingesting from {}", docs_dir.display());
    let loader = DocumentLoader::new();
    let documents = loader.load_directory(&docs_dir)?;
    if documents.is_empty() {
        println!("No supported documents found (.txt, .md, .docx)");
        return Ok(());
    }

    let embedder = build_embedder(config)?;
    let mut store = VectorStore::new(embedder);

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} {msg}",
    )?);

    let mut total_chunks = 0;
    for doc in &documents {
        pb.set_message(doc.filename.clone());
        let chunks =
            chunker::chunk_with_window(&doc.content, chunk_size, chunk_overlap, boundary_window)?;
        store.add(&chunks, Some(&doc.source_info()))?;
        total_chunks += chunks.len();
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (vectors_path, metadata_path) = snapshot_paths(config);
    if let Some(parent) = vectors_path.parent() {
        fs::create_dir_all(parent)?;
    }
    store.save(&vectors_path, &metadata_path)?;

    println!(
        "✅ Ingest complete ({} documents, {} chunks)",
        documents.len(),
        total_chunks
    );
    Ok(())
}

fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if store.is_empty() {
        eprintln!("The index is empty. Run `docrag ingest` first.");
        std::process::exit(1);
    }

    let model: String = config.get_or("llm.model", "gpt-3.5-turbo".to_string());
    let base_url: String =
        config.get_or("llm.base_url", "https://api.openai.com/v1".to_string());
    let temperature = config.get_or("llm.temperature", DEFAULT_TEMPERATURE);
    let top_k = config.get_or("llm.top_k", DEFAULT_TOP_K);

    let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() {
        anyhow::bail!("OPENAI_API_KEY is not set; export it before running `docrag ask`");
    }
    let provider = OpenAiChat::new(api_key, base_url)?;

    let engine = RagEngine::new(Box::new(provider), model).with_temperature(temperature);
    let result = engine.query(&store, question, top_k)?;

    println!("{}\n", result.answer);
    for (i, doc) in result.retrieved_docs.iter().enumerate() {
        let source = doc
            .metadata
            .get("filename")
            .map(String::as_str)
            .unwrap_or("unknown");
        println!(
            "[Chunk {} | similarity {:.3} | distance {:.3} | {}]",
            i + 1,
            doc.similarity,
            doc.score,
            source
        );
        println!("{}\n", preview(&doc.text, 200));
    }
    Ok(())
}

fn stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.get_stats();
    println!("📊 Index Statistics");
    println!("Total chunks:     {}", stats.total_chunks);
    println!("Vector dimension: {}", stats.dimension);
    println!("Embedding model:  {}", stats.model_name);
    Ok(())
}

fn clear(config: &Config) -> anyhow::Result<()> {
    let (vectors_path, metadata_path) = snapshot_paths(config);
    for path in [&vectors_path, &metadata_path] {
        if path.exists() {
            fs::remove_file(path)?;
        }
    }
    println!("🗑️  Cleared index snapshot");
    Ok(())
}

/// First `max_chars` characters, with an ellipsis when truncated.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((at, _)) => format!("{}...", &text[..at]),
        None => text.to_string(),
    }
}
