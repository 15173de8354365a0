//! The embedder interface and its OpenAI implementation.

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::Embedding;
use crate::client::{ClientOptions, EmbeddingRequest, EmbeddingResponse, OpenAIClient};
use crate::config::{EmbedderConfig, PluginConfig};
use crate::error::Result;

/// Interface the host uses to turn text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Declared dimension of the vectors this embedder produces.
    fn size(&self) -> usize;

    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Generate the embedding for `text`.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Embedder backed by the OpenAI embeddings API.
///
/// Immutable after construction; safe to share across tasks behind an `Arc`.
/// The length of returned vectors is not checked against [`Embedder::size`]:
/// the declared size is what the host indexes with, and the remote model is
/// trusted to honour it.
#[derive(Debug)]
pub struct OpenAIEmbedder {
    config: EmbedderConfig,
    client: OpenAIClient,
}

impl OpenAIEmbedder {
    /// Validate `config` and build the client. No request is made here.
    pub fn new(config: &PluginConfig) -> Result<Self> {
        Self::from_config(config.validate()?)
    }

    /// Build from an already validated configuration.
    pub fn from_config(config: EmbedderConfig) -> Result<Self> {
        let client = OpenAIClient::new(config.client_options())?;
        info!("OpenAIEmbedder initialized with model '{}'", config.model);
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    /// Options the HTTP client was constructed with.
    pub fn client_options(&self) -> &ClientOptions {
        self.client.options()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn size(&self) -> usize {
        self.config.size
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };

        let embedding = self
            .client
            .create_embedding(&request)
            .await
            .and_then(EmbeddingResponse::into_first_embedding)
            .inspect_err(|err| {
                error!(model = %self.config.model, "Error generating embedding: {err}");
            })?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
