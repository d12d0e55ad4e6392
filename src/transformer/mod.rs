//! Manifest stream transformers.

mod image;
mod value;

pub use image::ImageTransformer;
pub use value::ValueTransformer;

/// Callback observing every successful field rewrite, invoked with the field
/// path, the previous value, and the replacement value.
pub type MutationTracker = Box<dyn Fn(&str, &str, &str) + Send + Sync>;

/// A whole-stream manifest transformation.
pub trait Transformer {
    /// Rewrite a multi-document manifest stream.
    fn transform(&self, input: &str) -> Result<String, TransformError>;

    /// Get the transformer name for logging.
    fn name(&self) -> &'static str;
}

/// Errors that can occur during transformation. All are fatal for the run;
/// no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Invalid document stream: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid base64 in secret data key '{key}': {source}")]
    Base64 {
        key: String,
        #[source]
        source: base64::DecodeError,
    },
}
