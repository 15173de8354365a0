//! Plugin settings resolved from a JSON file and environment variables.
//!
//! Each plugin reads its parameters from `plugins.<plugin_id>`. The same
//! table can be supplied through environment variables named
//! `<PREFIX>__PLUGINS__<PLUGIN_ID>__<PARAM>`; those override the file.
//! Plugin ids and parameter names are matched case-insensitively.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat, Value, ValueKind};
use rag2f_openai_embedder::PluginConfig;
use tracing::{debug, warn};

use crate::error::Result;

/// Environment prefix used when none is configured.
pub const DEFAULT_ENV_PREFIX: &str = "RAG2F";

const ENV_SEPARATOR: &str = "__";
const PLUGINS_KEY: &str = "plugins";

/// Resolved configuration of every plugin, keyed by lowercased plugin id.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    plugins: HashMap<String, PluginConfig>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Settings from the process environment only, using [`DEFAULT_ENV_PREFIX`].
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Add or replace the configuration of one plugin.
    pub fn with_plugin(mut self, plugin_id: &str, config: PluginConfig) -> Self {
        self.plugins.insert(plugin_id.to_lowercase(), config);
        self
    }

    /// Configuration for `plugin_id`, if any non-empty table exists for it.
    pub fn plugin_config(&self, plugin_id: &str) -> Option<&PluginConfig> {
        self.plugins
            .get(&plugin_id.to_lowercase())
            .filter(|config| !config.is_empty())
    }

    /// Ids of every configured plugin, sorted.
    pub fn plugin_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    config_file: Option<PathBuf>,
    env_prefix: String,
    env_vars: Option<config::Map<String, String>>,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            config_file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_vars: None,
        }
    }
}

impl SettingsBuilder {
    /// Read a JSON configuration file. The file must exist.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Use these variables instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn build(self) -> Result<Settings> {
        let mut builder = Config::builder();

        if let Some(path) = &self.config_file {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Json)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .source(self.env_vars),
        );

        let merged = builder.build()?;
        let table = match merged.get_table(PLUGINS_KEY) {
            Ok(table) => table,
            Err(config::ConfigError::NotFound(_)) => config::Map::new(),
            Err(err) => return Err(err.into()),
        };

        let mut plugins = HashMap::new();
        for (plugin_id, value) in table {
            let Ok(params) = value.into_table() else {
                debug!("Ignoring non-table settings entry for plugin '{plugin_id}'");
                continue;
            };

            let params: config::Map<String, Value> = params
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect();

            // A bad table only costs this plugin its settings.
            let plugin_config = match Value::new(None, ValueKind::Table(params))
                .try_deserialize::<PluginConfig>()
            {
                Ok(plugin_config) => plugin_config,
                Err(err) => {
                    warn!("Ignoring unreadable settings for plugin '{plugin_id}': {err}");
                    continue;
                }
            };

            plugins.insert(plugin_id.to_lowercase(), plugin_config);
        }

        debug!("Resolved settings for {} plugin(s)", plugins.len());
        Ok(Settings { plugins })
    }
}
