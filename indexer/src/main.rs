use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use docsearch_core::config::{ChunkingConfig, DEFAULT_CHUNK_SIZE, DEFAULT_K, DEFAULT_OVERLAP};
use docsearch_core::{extract_text, Chunker, DocumentIndex, FileType};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: Option<String>,
    #[serde(alias = "title")]
    filename: Option<String>,
    body: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Index documents in memory and query them by TF-IDF similarity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// Words per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Words shared by consecutive chunks
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    overlap: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the input and print the best matching chunks for a query
    Search {
        #[command(flatten)]
        input: InputArgs,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results
        #[arg(long, default_value_t = DEFAULT_K)]
        k: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Ingest the input and print corpus statistics
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { input, query, k, json } => {
            let index = load(&input)?;
            let hits = index.search(&query, k);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("No results found");
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    println!("{}. {} [{}] score={:.4}", rank + 1, hit.filename, hit.document_id, hit.score);
                    println!("   {}", preview(&hit.chunk_text, 200));
                }
            }
            Ok(())
        }
        Commands::Stats { input } => {
            let stats = load(&input)?.stats();
            println!("documents:  {}", stats.documents);
            println!("chunks:     {}", stats.chunks);
            println!("vocabulary: {}", stats.vocabulary);
            Ok(())
        }
    }
}

fn load(args: &InputArgs) -> Result<DocumentIndex> {
    let chunker = Chunker::new(ChunkingConfig::new(args.chunk_size, args.overlap)?)?;
    let index = build_index(Path::new(&args.input), &chunker)?;
    tracing::info!(documents = index.document_count(), chunks = index.len(), vocabulary = index.vocabulary_size(), "ingested documents");
    Ok(index)
}

fn build_index(input_path: &Path, chunker: &Chunker) -> Result<DocumentIndex> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }

    let mut index = DocumentIndex::new();
    for file in files {
        match file.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => index_jsonl(&file, &mut index, chunker)?,
            Some("json") => index_json(&file, &mut index, chunker)?,
            _ => index_file(&file, &mut index, chunker)?,
        }
    }
    Ok(index)
}

fn index_file(file: &Path, index: &mut DocumentIndex, chunker: &Chunker) -> Result<()> {
    let bytes = fs::read(file)?;
    let filename = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let file_type = FileType::detect(&filename, &bytes);
    match extract_text(file_type, &bytes) {
        Ok(text) => {
            let document_id = uuid::Uuid::new_v4().to_string();
            index.ingest_text(&document_id, &filename, &text, chunker);
        }
        Err(e) => tracing::warn!(path = %file.display(), error = %e, "skipping file"),
    }
    Ok(())
}

fn index_jsonl(file: &Path, index: &mut DocumentIndex, chunker: &Chunker) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)?;
        ingest_doc(doc, file, index, chunker);
    }
    Ok(())
}

fn index_json(file: &Path, index: &mut DocumentIndex, chunker: &Chunker) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                ingest_doc(doc, file, index, chunker);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            ingest_doc(doc, file, index, chunker);
        }
        _ => tracing::warn!(path = %file.display(), "expected a JSON object or array, skipping"),
    }
    Ok(())
}

fn ingest_doc(doc: InputDoc, source: &Path, index: &mut DocumentIndex, chunker: &Chunker) {
    let document_id = doc.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let filename = doc
        .filename
        .unwrap_or_else(|| source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
    let chunks = index.ingest_text(&document_id, &filename, &doc.body, chunker);
    if chunks == 0 {
        tracing::warn!(%document_id, "document has no text");
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
