//! Multi-document manifest stream handling.

use serde::Deserialize;
use serde_yaml::Value;

/// Top-level field naming the resource kind.
pub const KIND_KEY: &str = "kind";

/// Resource kind whose `data` values are base64-encoded.
pub const SECRET_KIND: &str = "Secret";

/// Secret field holding the base64-encoded payload mapping.
pub const DATA_KEY: &str = "data";

/// Serialized form marking a Secret document within a stream.
pub const SECRET_MARKER: &str = "kind: Secret";

/// Separator between documents in a stream.
const DOCUMENT_SEPARATOR: &str = "---\n";

/// Parse a multi-document stream into one node tree per document.
///
/// Empty documents (e.g. a trailing separator) are dropped. A document that
/// fails to parse aborts the whole stream.
pub fn parse_stream(input: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(input) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Whether a document's declared kind marks it as a Secret.
pub fn is_secret(document: &Value) -> bool {
    document.get(KIND_KEY).and_then(Value::as_str) == Some(SECRET_KIND)
}

/// Serialize documents into one stream with separators between them.
pub fn render_joined(documents: &[Value]) -> Result<String, serde_yaml::Error> {
    let mut out = String::new();
    for (idx, document) in documents.iter().enumerate() {
        if idx > 0 {
            out.push_str(DOCUMENT_SEPARATOR);
        }
        out.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(out)
}

/// Serialize documents into one stream, each with a leading separator.
pub fn render_prefixed(documents: &[Value]) -> Result<String, serde_yaml::Error> {
    let mut out = String::new();
    for document in documents {
        out.push_str(DOCUMENT_SEPARATOR);
        out.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(out)
}
