//! Activation hook: build the OpenAI embedder from settings and register it.
//!
//! The plugin id is passed in explicitly; it selects both the settings table
//! and the registry key.

use std::sync::Arc;

use rag2f_openai_embedder::{Embedder, EmbeddingError, OpenAIEmbedder};
use tracing::{debug, error, info, warn};

use crate::registry::EmbedderRegistry;
use crate::settings::Settings;

/// Default plugin id of the OpenAI embedder.
pub const PLUGIN_ID: &str = "rag2f_openai_embedder";

/// Outcome of [`activate`].
#[derive(Debug)]
pub enum Activation {
    /// The embedder was built and registered.
    Registered { size: usize, model: String },

    /// No configuration exists for the plugin; nothing was registered.
    Skipped,

    /// Construction failed; nothing was registered.
    Failed(EmbeddingError),
}

impl Activation {
    pub fn is_registered(&self) -> bool {
        matches!(self, Activation::Registered { .. })
    }
}

/// Build the embedder for `plugin_id` and insert it into `registry`.
///
/// Failures are logged and reported through the returned [`Activation`]; they
/// never abort the host.
pub async fn activate(
    plugin_id: &str,
    settings: &Settings,
    registry: &EmbedderRegistry,
) -> Activation {
    debug!("Activating plugin '{plugin_id}'");

    let Some(config) = settings.plugin_config(plugin_id) else {
        warn!(
            "No configuration found for plugin '{plugin_id}'. Embedder will not be registered. \
             Provide configuration via JSON or environment variables."
        );
        return Activation::Skipped;
    };

    match OpenAIEmbedder::new(config) {
        Ok(embedder) => {
            let size = embedder.size();
            let model = embedder.model().to_string();
            registry.register(plugin_id, Arc::new(embedder)).await;
            info!("OpenAI embedder registered as '{plugin_id}' (size={size}, model={model})");
            Activation::Registered { size, model }
        }
        Err(err @ EmbeddingError::Config(_)) => {
            error!(
                "Failed to initialize OpenAIEmbedder for plugin '{plugin_id}' due to configuration error: {err}"
            );
            Activation::Failed(err)
        }
        Err(err) => {
            error!("Unexpected error bootstrapping OpenAI embedder for plugin '{plugin_id}': {err}");
            Activation::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rag2f_openai_embedder::{ConfigError, PluginConfig};
    use serde_json::json;
    use tracing_test::traced_test;

    fn settings_with(plugin_id: &str, value: serde_json::Value) -> Settings {
        let config: PluginConfig = serde_json::from_value(value).unwrap();
        Settings::default().with_plugin(plugin_id, config)
    }

    #[tokio::test]
    #[traced_test]
    async fn test_skips_without_configuration() {
        let registry = EmbedderRegistry::new();

        let outcome = activate(PLUGIN_ID, &Settings::default(), &registry).await;

        assert!(matches!(outcome, Activation::Skipped));
        assert!(registry.is_empty().await);
        assert!(logs_contain("No configuration found for plugin 'rag2f_openai_embedder'"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_registers_configured_embedder() {
        let registry = EmbedderRegistry::new();
        let settings = settings_with(
            PLUGIN_ID,
            json!({
                "api_key": "sk-test-key-12345",
                "model": "text-embedding-3-small",
                "size": 1536,
            }),
        );

        let outcome = activate(PLUGIN_ID, &settings, &registry).await;

        assert!(outcome.is_registered());
        assert_eq!(registry.list_keys().await, vec![PLUGIN_ID]);
        let embedder = registry.get(PLUGIN_ID).await.unwrap();
        assert_eq!(embedder.size(), 1536);
        assert_eq!(embedder.model(), "text-embedding-3-small");
        assert!(logs_contain(
            "OpenAI embedder registered as 'rag2f_openai_embedder' (size=1536, model=text-embedding-3-small)"
        ));
    }

    #[tokio::test]
    async fn test_plugin_id_selects_settings_and_registry_key() {
        let registry = EmbedderRegistry::new();
        let settings = settings_with("secondary_embedder", json!({"model": "m", "size": "256"}));

        assert!(matches!(
            activate(PLUGIN_ID, &settings, &registry).await,
            Activation::Skipped
        ));

        match activate("secondary_embedder", &settings, &registry).await {
            Activation::Registered { size, model } => {
                assert_eq!(size, 256);
                assert_eq!(model, "m");
            }
            other => panic!("unexpected activation: {other:?}"),
        }
        assert!(registry.has("secondary_embedder").await);
        assert!(!registry.has(PLUGIN_ID).await);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_configuration_error_is_logged_not_registered() {
        let registry = EmbedderRegistry::new();
        let settings = settings_with(PLUGIN_ID, json!({"api_key": "sk-test"}));

        let outcome = activate(PLUGIN_ID, &settings, &registry).await;

        match outcome {
            Activation::Failed(EmbeddingError::Config(ConfigError::MissingParameters(keys))) => {
                assert_eq!(keys, vec!["model", "size"]);
            }
            other => panic!("unexpected activation: {other:?}"),
        }
        assert!(registry.is_empty().await);
        assert!(logs_contain("due to configuration error"));
        assert!(logs_contain("Missing required configuration parameters: model, size"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_invalid_value_names_parameter_in_log() {
        let registry = EmbedderRegistry::new();
        let settings = settings_with(PLUGIN_ID, json!({"model": "m", "size": 8, "timeout": "soon"}));

        let outcome = activate(PLUGIN_ID, &settings, &registry).await;

        assert!(matches!(outcome, Activation::Failed(_)));
        assert!(logs_contain("Parameter 'timeout' must be a number, got: soon"));
    }
}
