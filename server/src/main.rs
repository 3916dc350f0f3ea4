use anyhow::Result;
use axum::Router;
use clap::Parser;
use opsrank_core::Bm25Params;
use opsrank_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory containing *.md runbooks
    #[arg(long, default_value = "./data/runbooks")]
    runbooks: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = Bm25Params::default().k1)]
    k1: f64,
    /// BM25 length normalization strength
    #[arg(long, default_value_t = Bm25Params::default().b)]
    b: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app: Router = build_app(args.runbooks.clone(), Bm25Params { k1: args.k1, b: args.b })?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
