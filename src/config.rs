//! Configuration types for the manifest transformers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Rule configuration shared by both transformers.
///
/// The file may carry a kustomize plugin envelope (`apiVersion`, `kind`,
/// `metadata`); those keys are accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TransformConfig {
    #[serde(rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Registry replacements, evaluated in order; first prefix match wins.
    #[serde(rename = "imageRegistries")]
    pub image_registries: Vec<RegistryRule>,

    /// Extra field paths searched for image references, appended after the
    /// built-in defaults.
    #[serde(rename = "fieldPaths", alias = "FieldPaths")]
    pub field_paths: Vec<String>,

    /// Token values, overriding same-named command-line pairs.
    pub values: HashMap<String, String>,
}

/// Plugin envelope metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single registry replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryRule {
    /// Current registry prefix, e.g. `k8s.gcr.io`.
    pub name: String,
    /// Replacement registry, e.g. `my-k8s-mirror.cloud.example`.
    #[serde(rename = "newName")]
    pub new_name: String,
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("image registry name and newName cannot be empty")]
    InvalidRegistryRule,
}

impl TransformConfig {
    /// Load and validate a configuration file (YAML, or JSON for `.json`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.display().to_string(),
                source,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check registry rule invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.image_registries {
            if rule.name.is_empty() || rule.new_name.is_empty() {
                return Err(ConfigError::InvalidRegistryRule);
            }
        }
        Ok(())
    }

    /// Build the token map: command-line pairs first, then file `values`
    /// overwrite any same-named entry.
    pub fn token_map(&self, args: &[String]) -> HashMap<String, String> {
        let mut tokens = parse_token_pairs(args);
        for (name, value) in &self.values {
            tokens.insert(name.clone(), value.clone());
        }
        tokens
    }
}

/// Parse inline token pairs from positional arguments.
///
/// Two forms are accepted: `key:value` in a single argument, and `key:`
/// followed by the value as the next argument. Keys and values are
/// whitespace-trimmed; later arguments overwrite earlier ones.
pub fn parse_token_pairs(args: &[String]) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for (idx, arg) in args.iter().enumerate() {
        if let Some((key, value)) = arg.split_once(':') {
            if !value.is_empty() {
                pairs.insert(key.trim().to_string(), value.trim().to_string());
                continue;
            }
        }
        if let Some(key) = arg.strip_suffix(':') {
            if let Some(value) = args.get(idx + 1) {
                pairs.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    pairs
}
