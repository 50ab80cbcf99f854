//! # Code RAG - Code-aware retrieval tools for conversational agents
//!
//! Extracts top-level assignments and function definitions from a Python source
//! tree, splits them into token-bounded chunks, embeds them locally and serves
//! similarity search over the result. The retriever is offered to an agent next
//! to a web search tool and a sandboxed Python interpreter.
//!
//! ## Architecture
//!
//! ```text
//! source tree ─► FileWalker ─► Documents ─► CodeChunker ─► FastEmbed ─► LanceDB
//!                (tree-sitter,                (tokenizers)               │
//!                 regex)                                                 ▼
//!                                          ToolSet / MCP ◄──────── CodeRetriever
//!                                   [search, python_interpretor, retrieve_code_data]
//! ```
//!
//! ## Modules
//!
//! - [`indexer`]: File walking, identifier/function extraction, and token chunking
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`vector_db`]: Vector index backed by an embedded LanceDB table
//! - [`client`]: Indexing pipeline entry point
//! - [`retriever`]: Top-k similarity search over a built index
//! - [`tools`]: Agent tools (web search, code sandbox, retriever)
//! - [`mcp_server`]: MCP stdio server exposing the tools
//! - [`config`]: Configuration management with environment variable support
//! - [`types`]: Documents and request types with JSON schema
//! - [`error`]: Error types
//! - [`paths`]: Platform directories
//!
//! ## Usage Example
//!
//! ```no_run
//! use code_rag::RagClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RagClient::new().await?;
//!     let (retriever, _stats) = client.build_index("./my_project").await?;
//!
//!     for doc in retriever.retrieve("how are prompts built").await? {
//!         println!("[{}] {}\n{}", doc.metadata.unit_type, doc.metadata.file, doc.content);
//!     }
//!     Ok(())
//! }
//! ```

/// Indexing pipeline entry point
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// File walking, snippet extraction, and chunking
pub mod indexer;

/// MCP server exposing the agent tools
pub mod mcp_server;

/// Platform-specific directories
pub mod paths;

/// Similarity search over a built index
pub mod retriever;

/// Agent tools and the ordered tool set
pub mod tools;

/// Documents, unit types and request types
pub mod types;

/// Vector index abstraction backed by LanceDB
pub mod vector_db;

pub use client::RagClient;
pub use config::Config;
pub use error::RagError;
pub use retriever::CodeRetriever;
pub use tools::{AgentTool, RunConfig, ToolCall, ToolSet};
pub use types::{Document, DocumentMetadata, IndexStats, UnitType};
