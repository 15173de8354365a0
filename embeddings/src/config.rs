//! Plugin configuration and its validation.
//!
//! The host hands the plugin a loosely typed mapping: values read from a JSON
//! file keep their JSON type, values read from environment variables are all
//! strings. [`PluginConfig`] captures that mapping and [`PluginConfig::validate`]
//! turns it into a typed [`EmbedderConfig`] exactly once, at construction.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientOptions;
use crate::error::ConfigError;

/// Request timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Retry budget applied when the configuration does not set one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// A configuration value as supplied by the host.
///
/// Anything that is not a scalar (arrays, tables) lands in `Other` so that
/// validation can reject it with the parameter name instead of failing to
/// deserialize the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Other(serde_json::Value),
}

impl ConfigValue {
    /// Empty strings, zero, `false` and empty collections count as
    /// "not provided".
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Bool(b) => *b,
            ConfigValue::Integer(i) => *i != 0,
            ConfigValue::Float(f) => *f != 0.0,
            ConfigValue::String(s) => !s.is_empty(),
            ConfigValue::Other(serde_json::Value::Array(items)) => !items.is_empty(),
            ConfigValue::Other(serde_json::Value::Object(map)) => !map.is_empty(),
            ConfigValue::Other(value) => !value.is_null(),
        }
    }

    /// Integer view of the value. Floats qualify only when they have no
    /// fractional part; booleans never do.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            ConfigValue::String(s) => s.trim().parse().ok(),
            ConfigValue::Float(_) | ConfigValue::Bool(_) | ConfigValue::Other(_) => None,
        }
    }

    /// Floating point view of the value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::String(s) => s.trim().parse().ok(),
            ConfigValue::Bool(_) | ConfigValue::Other(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

/// Raw plugin configuration, one optional field per recognised key.
///
/// Unknown keys are ignored when deserializing.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Secret for the embeddings API.
    pub api_key: Option<ConfigValue>,

    /// Embedding model identifier (required).
    pub model: Option<ConfigValue>,

    /// Expected vector dimension (required).
    pub size: Option<ConfigValue>,

    /// Request timeout in seconds.
    pub timeout: Option<ConfigValue>,

    /// Retry budget for the HTTP client.
    pub max_retries: Option<ConfigValue>,

    /// Override for the API endpoint, e.g. a local OpenAI-compatible server.
    pub base_url: Option<ConfigValue>,
}

impl PluginConfig {
    /// True when no recognised key carries a value.
    pub fn is_empty(&self) -> bool {
        [
            &self.api_key,
            &self.model,
            &self.size,
            &self.timeout,
            &self.max_retries,
            &self.base_url,
        ]
        .iter()
        .all(|value| value.is_none())
    }

    /// Check presence of the required keys, then coerce the numeric ones.
    ///
    /// Presence is checked for `model` and `size` together so the error lists
    /// every missing key. No coercion is attempted until both are present.
    pub fn validate(&self) -> Result<EmbedderConfig, ConfigError> {
        let model = self.model.as_ref().filter(|v| v.is_truthy());
        let size = self.size.as_ref().filter(|v| v.is_truthy());

        let (model, size) = match (model, size) {
            (Some(model), Some(size)) => (model, size),
            (model, size) => {
                let missing = [("model", model.is_none()), ("size", size.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                return Err(ConfigError::MissingParameters(missing));
            }
        };

        let size = size
            .as_integer()
            .filter(|s| *s > 0)
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| invalid("size", "an integer", size))?;

        let timeout = match &self.timeout {
            Some(value) => value
                .as_float()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| invalid("timeout", "a number", value))?,
            None => Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        };

        let max_retries = match &self.max_retries {
            Some(value) => value
                .as_integer()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid("max_retries", "an integer", value))?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(EmbedderConfig {
            model: model.to_string(),
            size,
            timeout,
            max_retries,
            api_key: passthrough(&self.api_key),
            base_url: passthrough(&self.base_url),
        })
    }
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("size", &self.size)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn invalid(name: &'static str, expected: &'static str, value: &ConfigValue) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        expected,
        value: value.to_string(),
    }
}

fn passthrough(value: &Option<ConfigValue>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| v.is_truthy())
        .map(ToString::to_string)
}

/// Validated embedder configuration.
#[derive(Clone, PartialEq)]
pub struct EmbedderConfig {
    pub model: String,
    pub size: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl EmbedderConfig {
    /// Options forwarded to the HTTP client. Unset values stay `None` so the
    /// client applies its own defaults.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            max_retries: self.max_retries,
        }
    }
}

impl fmt::Debug for EmbedderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedderConfig")
            .field("model", &self.model)
            .field("size", &self.size)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config(value: serde_json::Value) -> PluginConfig {
        serde_json::from_value(value).unwrap()
    }

    fn missing(value: serde_json::Value) -> Vec<&'static str> {
        match config(value).validate() {
            Err(ConfigError::MissingParameters(keys)) => keys,
            other => panic!("expected missing parameters, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_keys_are_all_reported() {
        assert_eq!(missing(json!({})), vec!["model", "size"]);
        assert_eq!(missing(json!({"api_key": "sk-test"})), vec!["model", "size"]);
        assert_eq!(missing(json!({"model": "text-embedding-3-small"})), vec!["size"]);
        assert_eq!(missing(json!({"size": 1536})), vec!["model"]);
    }

    #[test]
    fn test_empty_and_zero_values_count_as_missing() {
        assert_eq!(missing(json!({"model": "", "size": 0})), vec!["model", "size"]);
        assert_eq!(missing(json!({"model": "m", "size": ""})), vec!["size"]);
        assert_eq!(missing(json!({"model": null, "size": 8})), vec!["model"]);
    }

    #[test]
    fn test_presence_is_checked_before_coercion() {
        // `size` is garbage, but the missing model wins.
        assert_eq!(missing(json!({"size": "abc"})), vec!["model"]);
    }

    #[test]
    fn test_non_numeric_values_name_the_parameter() {
        for (key, expected) in [
            ("size", "Parameter 'size'"),
            ("timeout", "Parameter 'timeout'"),
            ("max_retries", "Parameter 'max_retries'"),
        ] {
            let mut raw = json!({"model": "m", "size": 1536});
            raw[key] = json!("not-a-number");
            let err = config(raw).validate().unwrap_err();
            let message = err.to_string();
            assert!(message.contains(expected), "{message}");
            assert!(message.contains("got: not-a-number"), "{message}");
        }
    }

    #[test]
    fn test_defaults_applied() {
        let validated = config(json!({"model": "m", "size": 1536})).validate().unwrap();
        assert_eq!(validated.timeout, Duration::from_secs(30));
        assert_eq!(validated.max_retries, 2);
        assert_eq!(validated.api_key, None);
        assert_eq!(validated.base_url, None);
    }

    #[test]
    fn test_string_values_are_coerced() {
        // Environment variables always arrive as strings.
        let validated = config(json!({
            "model": "text-embedding-3-large",
            "size": "3072",
            "timeout": "12.5",
            "max_retries": " 4 ",
        }))
        .validate()
        .unwrap();

        assert_eq!(validated.size, 3072);
        assert_eq!(validated.timeout, Duration::from_millis(12_500));
        assert_eq!(validated.max_retries, 4);
    }

    #[test]
    fn test_integral_float_size_is_accepted() {
        let validated = config(json!({"model": "m", "size": 512.0})).validate().unwrap();
        assert_eq!(validated.size, 512);

        let err = config(json!({"model": "m", "size": 512.5})).validate().unwrap_err();
        assert!(err.to_string().contains("'size'"));
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let err = config(json!({"model": "m", "size": -3})).validate().unwrap_err();
        assert!(err.to_string().contains("'size'"));

        let err = config(json!({"model": "m", "size": 8, "timeout": -1.0}))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("'timeout'"));

        let err = config(json!({"model": "m", "size": 8, "max_retries": -1}))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("'max_retries'"));
    }

    #[test]
    fn test_non_scalar_values_name_the_parameter() {
        let err = config(json!({"model": "m", "size": [1536]})).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter 'size' must be an integer, got: [1536]"
        );

        let err = config(json!({"model": "m", "size": 8, "timeout": {"secs": 5}}))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Parameter 'timeout'"));

        assert_eq!(missing(json!({"model": "m", "size": []})), vec!["size"]);
    }

    #[test]
    fn test_booleans_are_not_numbers() {
        let err = config(json!({"model": "m", "size": 8, "max_retries": true}))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParameter {
                name: "max_retries",
                expected: "an integer",
                value: "true".to_string(),
            }
        );
    }

    #[test]
    fn test_passthrough_values() {
        let validated = config(json!({
            "model": "m",
            "size": 8,
            "api_key": "sk-abc",
            "base_url": "http://localhost:8000/v1",
        }))
        .validate()
        .unwrap();
        assert_eq!(validated.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(validated.base_url.as_deref(), Some("http://localhost:8000/v1"));

        let validated = config(json!({"model": "m", "size": 8, "api_key": "", "base_url": ""}))
            .validate()
            .unwrap();
        assert_eq!(validated.api_key, None);
        assert_eq!(validated.base_url, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = config(json!({"model": "m", "size": 8, "dimensions": 8, "extra": [1, 2]}));
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_is_empty() {
        assert!(PluginConfig::default().is_empty());
        assert!(!config(json!({"timeout": 5})).is_empty());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let raw = config(json!({"model": "m", "size": 8, "api_key": "sk-secret"}));
        assert!(!format!("{raw:?}").contains("sk-secret"));
        assert!(!format!("{:?}", raw.validate().unwrap()).contains("sk-secret"));
    }
}
