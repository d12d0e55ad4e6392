//! Rule-driven value rewriting for Kubernetes manifest streams.
//!
//! Reads a multi-document YAML stream and rewrites values in place without
//! altering document structure or unrelated fields:
//!
//! - Image registry rewriting: container image references are repointed at
//!   mirrored registries via ordered prefix rules, with a fallback for
//!   implicit default-registry references
//! - Token substitution: `$NAME` placeholders are replaced with configured
//!   values, including inside base64-encoded Secret payloads
//!
//! ## Configuration Example
//!
//! ```yaml
//! imageRegistries:
//!   - name: k8s.gcr.io
//!     newName: my-mirror.cloud.example
//!   - name: dockerhub
//!     newName: my-mirror.cloud.example/dockerhub
//! fieldPaths:
//!   - spec/extraTemplate/spec/containers[]/image
//! values:
//!   REGION: eu-de-1
//! ```

pub mod config;
pub mod document;
pub mod path;
pub mod transformer;

pub use config::{ConfigError, RegistryRule, TransformConfig};
pub use path::{FieldPath, PathSegment};
pub use transformer::{
    ImageTransformer, MutationTracker, TransformError, Transformer, ValueTransformer,
};
