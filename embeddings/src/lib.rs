//! # OpenAI Embedder
//!
//! Adapts the OpenAI embeddings API to the RAG2F embedder interface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    OpenAI Embedder                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  PluginConfig ──► validate ──► EmbedderConfig                   │
//! │                                      │                          │
//! │                                      ▼                          │
//! │  Embedder::embed ◄── OpenAIEmbedder ──► OpenAIClient ──► HTTPS  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag2f_openai_embedder::{Embedder, OpenAIEmbedder, PluginConfig};
//!
//! let config: PluginConfig = serde_json::from_value(json!({
//!     "model": "text-embedding-3-small",
//!     "size": 1536,
//! }))?;
//! let embedder = OpenAIEmbedder::new(&config)?;
//! let vector = embedder.embed("hello world").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;

pub use client::{ClientOptions, OpenAIClient};
pub use config::{ConfigValue, EmbedderConfig, PluginConfig};
pub use error::{ConfigError, EmbeddingError, Result};
pub use provider::{Embedder, OpenAIEmbedder};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
