use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use groundqa_core::chunker::Chunker;
use groundqa_core::config::{Config, Settings};
use groundqa_core::extract::{extract_file, ExtractedDocument};
use groundqa_core::types::{Answer, RetrievedChunk};
use groundqa_core::Error;
use groundqa_embed::get_default_embedder;
use groundqa_hybrid::{retrieve, DocumentSession, QaService};
use groundqa_llm::{build_generator, LlmGenerator};

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const PREVIEW_CHARS: usize = 240;

/// Ask questions about a single document, answered only from its content.
#[derive(Parser, Debug)]
#[command(name = "groundqa", version, about, long_about = None)]
struct Cli {
    /// Config overlay to merge on top of config.toml (dev, prod, test)
    #[arg(long, global = true, env = "RUST_ENV")]
    config_env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document and answer one question with cited sources
    Ask {
        file: PathBuf,
        question: String,
        /// Print the answer, citations and sources as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the passages a question would be answered from, without calling the model
    Sources {
        file: PathBuf,
        query: String,
        /// Number of passages
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Load a document once, then answer questions read from stdin
    Chat { file: PathBuf },
    /// Print how a document is split into chunks
    Chunks { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config_env.as_deref() {
        Some(env) => Config::load_for_env(env),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let mut settings = config.settings()?;

    match cli.command {
        Command::Ask { file, question, json } => {
            let service = open_service(&settings, &file)?;
            let answer = service.ask(&question).await?;
            if json {
                print_json(&answer)?;
            } else {
                print_answer(&answer);
            }
        }
        Command::Sources { file, query, k } => {
            if let Some(k) = k {
                settings.retrieval.k = k;
            }
            let doc = load(&file)?;
            let session = index(&settings, &doc)?;
            let evidence = retrieve(&session, &query, settings.retrieval.k)?;
            if evidence.is_empty() {
                println!("No matching passages.");
            }
            print_sources(&evidence);
        }
        Command::Chat { file } => {
            let service = open_service(&settings, &file)?;
            chat(&service).await?;
        }
        Command::Chunks { file } => {
            let doc = load(&file)?;
            let chunker = Chunker::new(&settings.chunking)?;
            let chunks = chunker.split_document(&doc);
            println!(
                "{} chunks (size {}, overlap {}) from {} page(s)",
                chunks.len(),
                chunker.chunk_size(),
                chunker.chunk_overlap(),
                doc.pages.len()
            );
            for c in &chunks {
                let page = c.page.map(|p| format!(" page {}", p + 1)).unwrap_or_default();
                println!("#{:<4} [{}..{}){page} {}", c.ordinal, c.start, c.end, preview(&c.content, 60));
            }
        }
    }
    Ok(())
}

fn load(file: &Path) -> anyhow::Result<ExtractedDocument> {
    extract_file(file).with_context(|| format!("Failed to load {}", file.display()))
}

fn index(settings: &Settings, doc: &ExtractedDocument) -> anyhow::Result<DocumentSession> {
    let embedder = get_default_embedder(&settings.embedding)?;
    let chunker = Chunker::new(&settings.chunking)?;
    let pb = spinner("Indexing document...");
    let session = DocumentSession::build(doc, &chunker, embedder, settings.embedding.batch_size);
    pb.finish_and_clear();
    Ok(session?)
}

fn open_service(settings: &Settings, file: &Path) -> anyhow::Result<QaService<LlmGenerator>> {
    let doc = load(file)?;
    let generator = build_generator(&settings.llm)?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let service = QaService::new(settings, embedder, generator)?;
    let pb = spinner("Indexing document...");
    let loaded = service.load_extracted(&doc);
    pb.finish_and_clear();
    let session = loaded?;
    eprintln!("Loaded {} ({} chunks)", file.display(), session.chunks().len());
    Ok(service)
}

async fn chat(service: &QaService<LlmGenerator>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nAsk (or 'exit'): ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let question = line?;
        let question = question.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        match service.ask(question).await {
            Ok(answer) => print_answer(&answer),
            Err(Error::EmptyQuery) => continue,
            Err(e) if e.is_retriable() => eprintln!("{e} (try again)"),
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().tick_chars(SPINNER_CHARS).template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text.trim());
    let invalid = answer.invalid_citations();
    if !invalid.is_empty() {
        eprintln!("warning: answer cites missing sources {invalid:?}");
    }
    print_sources(&answer.evidence);
}

fn print_sources(evidence: &[RetrievedChunk]) {
    for (i, e) in evidence.iter().enumerate() {
        let page = e.chunk.page.map(|p| format!(", page {}", p + 1)).unwrap_or_default();
        println!("[Source {i}] chunk {} ({:?}{page})", e.chunk.ordinal, e.source);
        println!("    {}", preview(&e.chunk.content, PREVIEW_CHARS));
    }
}

fn print_json(answer: &Answer) -> anyhow::Result<()> {
    let out = serde_json::json!({
        "answer": answer.text,
        "citations": answer.citations(),
        "invalid_citations": answer.invalid_citations(),
        "sources": answer.evidence,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
