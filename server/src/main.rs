use anyhow::Result;
use axum::Router;
use clap::Parser;
use docsearch_core::config::{ChunkingConfig, DEFAULT_CHUNK_SIZE, DEFAULT_K, DEFAULT_OVERLAP};
use docsearch_core::SharedIndex;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Words per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Words shared by consecutive chunks; must be less than chunk size
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    overlap: usize,
    /// Results returned when a search does not ask for a count
    #[arg(long, default_value_t = DEFAULT_K)]
    default_k: usize,
    /// Upper bound on results per search
    #[arg(long, default_value_t = 100)]
    max_k: usize,
    /// Maximum upload body size in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = ServerConfig {
        chunking: ChunkingConfig::new(args.chunk_size, args.overlap)?,
        default_k: args.default_k,
        max_k: args.max_k,
        max_upload_bytes: args.max_upload_bytes,
    };
    let app: Router = build_app(SharedIndex::default(), &config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, chunk_size = args.chunk_size, overlap = args.overlap, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
