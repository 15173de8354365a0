//! # OpenAI Embedder Plugin
//!
//! Host-side wiring for the OpenAI embedder:
//!
//! - **Settings**: per-plugin configuration from a JSON file and
//!   `RAG2F__PLUGINS__<PLUGIN_ID>__<PARAM>` environment variables
//! - **Registry**: embedders keyed by plugin id
//! - **Bootstrap**: build the embedder for a plugin id and register it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag2f_openai_embedder_plugin::{EmbedderRegistry, PLUGIN_ID, Settings, activate};
//!
//! let settings = Settings::builder().config_file("rag2f.json").build()?;
//! let registry = EmbedderRegistry::new();
//! activate(PLUGIN_ID, &settings, &registry).await;
//!
//! if let Some(embedder) = registry.get(PLUGIN_ID).await {
//!     let vector = embedder.embed("hello").await?;
//! }
//! ```

pub mod bootstrap;
pub mod error;
pub mod registry;
pub mod settings;

pub use bootstrap::{Activation, PLUGIN_ID, activate};
pub use error::{PluginError, Result};
pub use registry::EmbedderRegistry;
pub use settings::{DEFAULT_ENV_PREFIX, Settings, SettingsBuilder};
