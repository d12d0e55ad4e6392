//! Image registry rewriting.

use super::{MutationTracker, TransformError, Transformer};
use crate::config::{ConfigError, RegistryRule, TransformConfig};
use crate::document;
use crate::path::FieldPath;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

/// Rule name marking the mirror for implicit default-registry references.
const DOCKERHUB_RULE: &str = "dockerhub";

/// Image references carrying an explicit registry: a registry segment, at
/// least one path separator, and a trailing tag. References that do not match
/// (e.g. `nginx:latest`) implicitly target the default registry.
static QUALIFIED_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<registry>[^/]+)/(?P<name>.+):(?P<tag>[^:/]+)$").unwrap());

/// Built-in field paths searched for image references.
const DEFAULT_IMAGE_PATHS: &[&str] = &[
    "spec/template/spec/containers[]/image",
    "spec/template/spec/initContainers[]/image",
    "spec/jobTemplate/spec/template/spec/containers[]/image",
    "spec/jobTemplate/spec/template/spec/initContainers[]/image",
];

/// Rewrites container image references to point at mirrored registries.
pub struct ImageTransformer {
    registries: Vec<RegistryRule>,
    field_paths: Vec<FieldPath>,
    mutation_tracker: Option<MutationTracker>,
}

impl ImageTransformer {
    /// Create a transformer from validated configuration. Configured extra
    /// field paths are appended after the built-in defaults.
    pub fn new(config: &TransformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut field_paths: Vec<FieldPath> = DEFAULT_IMAGE_PATHS
            .iter()
            .map(|spec| FieldPath::parse(spec))
            .collect();
        field_paths.extend(config.field_paths.iter().map(|spec| FieldPath::parse(spec)));
        Ok(Self {
            registries: config.image_registries.clone(),
            field_paths,
            mutation_tracker: None,
        })
    }

    /// Register a callback observing every rewrite.
    pub fn with_mutation_tracker(mut self, tracker: MutationTracker) -> Self {
        self.mutation_tracker = Some(tracker);
        self
    }

    /// Compute the rewritten image reference, or `None` when no rule applies.
    ///
    /// Rules are scanned in order and the first whose `name` is a prefix of
    /// the image wins: the prefix and any following separator are stripped
    /// and `new_name` is prepended. An unmatched image that lacks an explicit
    /// registry falls back to the `dockerhub` rule, if configured, which
    /// prepends its `new_name` without stripping anything.
    fn rewrite(&self, image: &str) -> Option<String> {
        for rule in &self.registries {
            if let Some(rest) = image.strip_prefix(rule.name.as_str()) {
                let rest = rest.trim_start_matches('/');
                return Some(format!("{}/{}", rule.new_name, rest));
            }
        }
        if !QUALIFIED_IMAGE.is_match(image) {
            if let Some(mirror) = self.registries.iter().find(|r| r.name == DOCKERHUB_RULE) {
                return Some(format!("{}/{}", mirror.new_name, image));
            }
        }
        None
    }

    fn rewrite_document(&self, doc: &mut Value) {
        for path in &self.field_paths {
            path.for_each_scalar(doc, &mut |node| {
                let Value::String(image) = node else { return };
                if let Some(rewritten) = self.rewrite(image) {
                    if let Some(tracker) = &self.mutation_tracker {
                        tracker(&path.to_string(), image, &rewritten);
                    }
                    *image = rewritten;
                }
            });
        }
    }
}

impl Transformer for ImageTransformer {
    fn transform(&self, input: &str) -> Result<String, TransformError> {
        let mut documents = document::parse_stream(input)?;
        for doc in &mut documents {
            self.rewrite_document(doc);
        }
        document::render_joined(&documents).map_err(TransformError::from)
    }

    fn name(&self) -> &'static str {
        "image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn transformer(rules: &[(&str, &str)]) -> ImageTransformer {
        let config = TransformConfig {
            image_registries: rules
                .iter()
                .map(|(name, new_name)| RegistryRule {
                    name: name.to_string(),
                    new_name: new_name.to_string(),
                })
                .collect(),
            ..Default::default()
        };
        ImageTransformer::new(&config).unwrap()
    }

    #[test]
    fn test_prefix_rewrite() {
        let t = transformer(&[("k8s.gcr.io", "mirror.example.com/k8s")]);
        assert_eq!(
            t.rewrite("k8s.gcr.io/pause:3.9"),
            Some("mirror.example.com/k8s/pause:3.9".to_string())
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let t = transformer(&[
            ("gcr.io", "first.example.com"),
            ("gcr.io/project", "second.example.com"),
        ]);
        assert_eq!(
            t.rewrite("gcr.io/project/app:1.0"),
            Some("first.example.com/project/app:1.0".to_string())
        );
    }

    #[test]
    fn test_dockerhub_fallback_for_implicit_registry() {
        let t = transformer(&[("dockerhub", "gcr.io/mirror")]);
        assert_eq!(
            t.rewrite("nginx:latest"),
            Some("gcr.io/mirror/nginx:latest".to_string())
        );
    }

    #[test]
    fn test_dockerhub_fallback_for_untagged_image() {
        let t = transformer(&[("dockerhub", "gcr.io/mirror")]);
        assert_eq!(t.rewrite("nginx"), Some("gcr.io/mirror/nginx".to_string()));
    }

    #[test]
    fn test_qualified_image_without_rule_is_unchanged() {
        let t = transformer(&[("dockerhub", "gcr.io/mirror")]);
        assert_eq!(t.rewrite("otherregistry/nginx:latest"), None);
    }

    #[test]
    fn test_no_rules_leaves_image_unchanged() {
        let t = transformer(&[]);
        assert_eq!(t.rewrite("nginx:latest"), None);
    }

    #[test]
    fn test_deployment_stream_rewrite() {
        let input = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: deploy1
spec:
  template:
    spec:
      containers:
      - image: nginx:latest
        name: nginx
"#;
        let t = transformer(&[("dockerhub", "gcr.io/test")]);
        let output = t.transform(input).unwrap();
        assert!(output.contains("image: gcr.io/test/nginx:latest"));
        assert!(output.contains("name: deploy1"));
        assert!(output.contains("name: nginx"));
    }

    #[test]
    fn test_init_containers_and_job_template_paths() {
        let input = r#"kind: CronJob
spec:
  jobTemplate:
    spec:
      template:
        spec:
          containers:
          - image: k8s.gcr.io/busybox:1.36
          initContainers:
          - image: k8s.gcr.io/setup:v1
"#;
        let t = transformer(&[("k8s.gcr.io", "mirror.example.com")]);
        let output = t.transform(input).unwrap();
        assert!(output.contains("image: mirror.example.com/busybox:1.36"));
        assert!(output.contains("image: mirror.example.com/setup:v1"));
    }

    #[test]
    fn test_extra_field_paths_are_appended() {
        let config = TransformConfig {
            image_registries: vec![RegistryRule {
                name: "k8s.gcr.io".to_string(),
                new_name: "mirror.example.com".to_string(),
            }],
            field_paths: vec!["spec/sidecars[]/image".to_string()],
            ..Default::default()
        };
        let t = ImageTransformer::new(&config).unwrap();
        let input = "spec:\n  sidecars:\n  - image: k8s.gcr.io/proxy:v2\n";
        let output = t.transform(input).unwrap();
        assert!(output.contains("image: mirror.example.com/proxy:v2"));
    }

    #[test]
    fn test_non_image_fields_pass_through() {
        let input = r#"kind: Deployment
spec:
  replicas: 3
  template:
    spec:
      containers:
      - image: nginx:latest
        name: nginx
        ports:
        - containerPort: 80
"#;
        let t = transformer(&[("dockerhub", "gcr.io/test")]);
        let output = t.transform(input).unwrap();
        assert!(output.contains("replicas: 3"));
        assert!(output.contains("containerPort: 80"));
    }

    #[test]
    fn test_mutation_tracker_observes_rewrites() {
        let seen: Arc<Mutex<Vec<(String, String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let t = transformer(&[("dockerhub", "gcr.io/test")]).with_mutation_tracker(Box::new(
            move |path, old, new| {
                sink.lock()
                    .unwrap()
                    .push((path.to_string(), old.to_string(), new.to_string()));
            },
        ));

        let input = "spec:\n  template:\n    spec:\n      containers:\n      - image: nginx:latest\n";
        t.transform(input).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "spec/template/spec/containers[]/image");
        assert_eq!(seen[0].1, "nginx:latest");
        assert_eq!(seen[0].2, "gcr.io/test/nginx:latest");
    }

    #[test]
    fn test_empty_container_list_is_not_an_error() {
        let input = "spec:\n  template:\n    spec:\n      containers: []\n";
        let t = transformer(&[("dockerhub", "gcr.io/test")]);
        let output = t.transform(input).unwrap();
        assert!(output.contains("containers: []"));
    }
}
