//! Token substitution, including inside base64-encoded Secret payloads.

use super::{TransformError, Transformer};
use crate::document::{self, DATA_KEY, SECRET_MARKER};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_yaml::Value;
use std::collections::HashMap;

/// Substitutes `$NAME` placeholder tokens with configured values.
pub struct ValueTransformer {
    replacements: HashMap<String, String>,
}

impl ValueTransformer {
    /// Create a transformer from a merged token map.
    pub fn new(replacements: HashMap<String, String>) -> Self {
        Self { replacements }
    }

    /// Replace every `$NAME` occurrence in plain text, one pass per token.
    /// Replacement values are not re-scanned for the same token.
    fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (name, value) in &self.replacements {
            out = out.replace(&format!("${name}"), value);
        }
        out
    }

    /// Replace every `$NAME` occurrence in raw bytes. Decoded secret payloads
    /// are not guaranteed to be valid UTF-8, so substitution runs at the byte
    /// level.
    fn substitute_bytes(&self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        for (name, value) in &self.replacements {
            out = replace_all(&out, format!("${name}").as_bytes(), value.as_bytes());
        }
        out
    }

    /// Transcode every string value under a Secret's `data` mapping:
    /// base64-decode, substitute, re-encode. A `data` field that is absent or
    /// not a mapping is left untouched; an undecodable value is fatal.
    fn substitute_secret_data(&self, doc: &mut Value) -> Result<(), TransformError> {
        let Some(Value::Mapping(data)) = doc.get_mut(DATA_KEY) else {
            return Ok(());
        };
        for (key, value) in data.iter_mut() {
            let Value::String(encoded) = value else {
                continue;
            };
            let decoded =
                BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|source| TransformError::Base64 {
                        key: key.as_str().unwrap_or_default().to_string(),
                        source,
                    })?;
            *encoded = BASE64.encode(self.substitute_bytes(&decoded));
        }
        Ok(())
    }
}

impl Transformer for ValueTransformer {
    fn transform(&self, input: &str) -> Result<String, TransformError> {
        let substituted = self.substitute(input);

        // Fast path: no Secret in the stream means nothing base64-encoded
        // is left to transcode.
        if !substituted.contains(SECRET_MARKER) {
            return Ok(substituted);
        }

        let mut documents = document::parse_stream(&substituted)?;
        for doc in &mut documents {
            if document::is_secret(doc) {
                self.substitute_secret_data(doc)?;
            }
        }
        document::render_prefixed(&documents).map_err(TransformError::from)
    }

    fn name(&self) -> &'static str {
        "value"
    }
}

/// Replace every occurrence of `needle` in `haystack` with `replacement`.
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
