//! # Code RAG CLI (`code-rag`)
//!
//! | Command | Description |
//! |---------|-------------|
//! | `code-rag index [PATH]` | Build the index for a source tree and print its statistics |
//! | `code-rag query [--path PATH] [-k K] QUERY` | Build the index and run one retrieval |
//! | `code-rag extract FILE` | Print the identifiers and functions found in one file |
//! | `code-rag serve [--path PATH]` | Run the MCP server over stdio |

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use code_rag::config::Config;
use code_rag::indexer::{AstParser, extract_elements};
use code_rag::mcp_server::CodeRagMcpServer;
use code_rag::paths::PlatformPaths;
use code_rag::RagClient;
use std::path::PathBuf;
use tracing::Level;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Code-aware retrieval tools for conversational agents
#[derive(Parser)]
#[command(name = "code-rag", version, long_version = LONG_VERSION)]
struct Cli {
    /// Path to a TOML configuration file
    ///
    /// Defaults to `<config_dir>/code-rag/config.toml` when present.
    #[arg(long, global = true, env = "CODE_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Embedding model name (overrides config and environment)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Maximum chunk size in tokens
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Token overlap between consecutive chunks
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index for a source tree and print statistics
    Index {
        /// Root of the source tree
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the index and print the documents closest to QUERY as JSON
    Query {
        /// Root of the source tree
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Number of documents to return
        #[arg(short)]
        k: Option<usize>,

        query: String,
    },

    /// Print the snippets extracted from one file as JSON
    Extract { file: PathBuf },

    /// Run the MCP server over stdio
    Serve {
        /// Root of the source tree indexed on first retrieval
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(model) = &self.model {
            config.embedding.model_name = model.clone();
        }
        if let Some(size) = self.chunk_size {
            config.indexing.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.indexing.chunk_overlap = overlap;
        }
        if let Commands::Query { k: Some(k), .. } = &self.command {
            config.search.top_k = *k;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries MCP traffic and command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match &cli.command {
        Commands::Index { path } => {
            let client = RagClient::with_config(cli.load_config()?).await?;
            let (_retriever, stats) = client.build_index(path).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Query { path, query, .. } => {
            let client = RagClient::with_config(cli.load_config()?).await?;
            let (retriever, _stats) = client.build_index(path).await?;
            let documents = retriever.retrieve(query).await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        Commands::Extract { file } => {
            let source = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut parser = AstParser::python()?;
            let elements = extract_elements(&mut parser, &source);
            println!("{}", serde_json::to_string_pretty(&elements)?);
        }
        Commands::Serve { path } => {
            let root = PlatformPaths::normalize_path(path)
                .with_context(|| format!("Source root not found: {}", path.display()))?;
            let server = CodeRagMcpServer::new(cli.load_config()?, root).await?;
            server.serve_stdio().await?;
        }
    }

    Ok(())
}
