use anyhow::Result;
use clap::{Parser, Subcommand};
use opsrank::seed::seed_runbooks;
use opsrank::{hit_lines, search_runbooks, snippet};
use opsrank_core::Bm25Params;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "opsrank")]
#[command(about = "Rank operational runbooks against an incident description with BM25", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a directory of Markdown runbooks
    Search {
        /// Directory containing *.md runbooks
        #[arg(long, default_value = "./data/runbooks")]
        runbooks: PathBuf,
        /// Free-text query, e.g. an incident description
        #[arg(long)]
        query: String,
        /// Number of results to return
        #[arg(long, default_value_t = 5)]
        k: usize,
        /// BM25 term-frequency saturation
        #[arg(long, default_value_t = Bm25Params::default().k1)]
        k1: f64,
        /// BM25 length normalization strength
        #[arg(long, default_value_t = Bm25Params::default().b)]
        b: f64,
        /// Print results as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the sample runbooks to a directory
    Seed {
        /// Output directory
        #[arg(long, default_value = "./data/runbooks")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { runbooks, query, k, k1, b, json } => {
            tracing::info!(%query, k, "starting BM25 search");
            let results = search_runbooks(&runbooks, &query, k, Bm25Params { k1, b })?;
            tracing::info!("Found {} results", results.len());
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (line, hit) in hit_lines(&results).iter().zip(&results) {
                    println!("{line}");
                    tracing::debug!("Text snippet: {}", snippet(&hit.text, 200));
                }
            }
            Ok(())
        }
        Commands::Seed { output } => {
            seed_runbooks(&output)?;
            Ok(())
        }
    }
}
