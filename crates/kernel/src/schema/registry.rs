//! Block type registry and content validation.
//!
//! Each block type declares its field rules once; `validate_and_normalize`
//! applies them, filling documented defaults for missing optional fields and
//! collecting every offending field into a [`FieldErrors`] map.
//!
//! Unknown types are fail-open (accepted with a warning, so custom types
//! from future front-end versions don't brick stored documents); known types
//! with malformed data are fail-closed.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::FieldErrors;

/// 6-hex-digit color notation, e.g. `#1a2b3c`.
static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color pattern is valid")
});

/// What values a content field accepts.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Plain text. Escaped at render time, any string accepted here.
    Plain,
    /// Rich text. Normalized to ammonia's sanitized form, so stored content
    /// never carries disallowed markup and re-validation is a no-op.
    Rich,
    /// Integer within an inclusive range.
    Integer { min: i64, max: i64 },
    /// 6-hex-digit color (`#rrggbb`).
    Color,
    /// http(s) URL, or a site-relative path, or `#`.
    Url,
    /// One of a fixed set of values.
    Enum(&'static [&'static str]),
    /// Boolean flag.
    Boolean,
}

/// Validation/defaulting rule for one content field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields must be present in submitted content; their default
    /// is only used when building a brand-new block's content.
    pub required: bool,
    /// Default filled in for missing optional fields during normalization,
    /// and used as the seed value for `default_content`.
    pub default: Option<Value>,
}

impl FieldRule {
    fn required(name: &'static str, kind: FieldKind, seed: Value) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: Some(seed),
        }
    }

    fn optional(name: &'static str, kind: FieldKind, default: Value) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
        }
    }

    fn absent_ok(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }
}

/// Schema for a single block type.
#[derive(Debug, Clone)]
pub struct BlockSchema {
    /// Machine name of the block type (e.g. "heading", "cta").
    pub type_name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    pub fields: Vec<FieldRule>,
}

/// Registry of block schemas, keyed by type name.
#[derive(Debug, Clone)]
pub struct BlockSchemaRegistry {
    types: HashMap<String, BlockSchema>,
}

impl Default for BlockSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the 8 standard block types.
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        registry.register_standard_types();
        registry
    }

    /// Register a single block schema.
    pub fn register(&mut self, schema: BlockSchema) {
        self.types.insert(schema.type_name.to_string(), schema);
    }

    /// Look up a block schema by type name.
    pub fn get(&self, type_name: &str) -> Option<&BlockSchema> {
        self.types.get(type_name)
    }

    /// Check whether a block type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// List all registered type names.
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Register the 8 standard block types: section, container, heading,
    /// text, button, image, hero, cta.
    pub fn register_standard_types(&mut self) {
        use FieldKind::{Color, Enum, Integer, Plain, Rich, Url};

        const ALIGNMENTS: &[&str] = &["left", "center", "right", "justify"];
        const VARIANTS: &[&str] = &["primary", "secondary", "outline"];

        self.register(BlockSchema {
            type_name: "section",
            label: "Section",
            fields: vec![
                FieldRule::optional(
                    "backgroundColor",
                    Color,
                    Value::String("#ffffff".into()),
                ),
                FieldRule::optional("padding", Integer { min: 0, max: 100 }, 24.into()),
            ],
        });

        self.register(BlockSchema {
            type_name: "container",
            label: "Container",
            fields: vec![
                FieldRule::optional(
                    "maxWidth",
                    Integer {
                        min: 320,
                        max: 1920,
                    },
                    1140.into(),
                ),
                FieldRule::optional("padding", Integer { min: 0, max: 100 }, 16.into()),
            ],
        });

        self.register(BlockSchema {
            type_name: "heading",
            label: "Heading",
            fields: vec![
                FieldRule::required("text", Rich, Value::String("Heading".into())),
                FieldRule::optional("level", Integer { min: 1, max: 6 }, 2.into()),
                FieldRule::optional("align", Enum(ALIGNMENTS), Value::String("left".into())),
                FieldRule::optional("color", Color, Value::String("#111111".into())),
            ],
        });

        self.register(BlockSchema {
            type_name: "text",
            label: "Text",
            fields: vec![
                FieldRule::required("text", Rich, Value::String(String::new())),
                FieldRule::optional("align", Enum(ALIGNMENTS), Value::String("left".into())),
                FieldRule::optional("color", Color, Value::String("#333333".into())),
            ],
        });

        self.register(BlockSchema {
            type_name: "button",
            label: "Button",
            fields: vec![
                FieldRule::required("label", Plain, Value::String("Button".into())),
                FieldRule::required("url", Url, Value::String("#".into())),
                FieldRule::optional("variant", Enum(VARIANTS), Value::String("primary".into())),
                FieldRule::optional(
                    "backgroundColor",
                    Color,
                    Value::String("#2563eb".into()),
                ),
            ],
        });

        self.register(BlockSchema {
            type_name: "image",
            label: "Image",
            fields: vec![
                FieldRule::required(
                    "url",
                    Url,
                    Value::String("/images/placeholder.png".into()),
                ),
                FieldRule::optional("alt", Plain, Value::String(String::new())),
                FieldRule::absent_ok("caption", Plain),
                FieldRule::optional("borderWidth", Integer { min: 0, max: 10 }, 0.into()),
            ],
        });

        self.register(BlockSchema {
            type_name: "hero",
            label: "Hero",
            fields: vec![
                FieldRule::required("title", Plain, Value::String("Hero title".into())),
                FieldRule::absent_ok("subtitle", Plain),
                FieldRule::absent_ok("imageUrl", Url),
                FieldRule::optional(
                    "backgroundColor",
                    Color,
                    Value::String("#0f172a".into()),
                ),
                FieldRule::optional("padding", Integer { min: 0, max: 100 }, 64.into()),
            ],
        });

        self.register(BlockSchema {
            type_name: "cta",
            label: "Call to Action",
            fields: vec![
                FieldRule::required("title", Plain, Value::String("Call to action".into())),
                FieldRule::absent_ok("body", Rich),
                FieldRule::required("buttonLabel", Plain, Value::String("Learn more".into())),
                FieldRule::required("buttonUrl", Url, Value::String("#".into())),
                FieldRule::optional("primaryColor", Color, Value::String("#2563eb".into())),
            ],
        });
    }

    /// Validate candidate content for a block type and return its
    /// normalized form.
    ///
    /// - Missing optional fields are populated with their documented
    ///   defaults; missing required fields are errors.
    /// - Rich text fields are rewritten to their sanitized form (script
    ///   tags stripped, bare entities encoded) rather than rejected.
    /// - Every offending field is reported, keyed by field path.
    /// - Unknown extra fields pass through unchanged (the editor front-end
    ///   may carry presentation hints the kernel does not interpret).
    /// - Unknown *types* are accepted as-is with a warning — fail-open for
    ///   custom types, fail-closed for known types with malformed data.
    ///
    /// Normalization is a fixed point: validating already-normalized
    /// content returns it unchanged.
    pub fn validate_and_normalize(
        &self,
        type_name: &str,
        content: &Value,
    ) -> Result<Value, FieldErrors> {
        let Some(schema) = self.get(type_name) else {
            warn!(block_type = %type_name, "unknown block type, accepting content as-is");
            return Ok(content.clone());
        };

        let Some(object) = content.as_object() else {
            let mut errors = FieldErrors::new();
            errors.push("content", "must be a JSON object");
            return Err(errors);
        };

        let mut errors = FieldErrors::new();
        let mut normalized = object.clone();

        for rule in &schema.fields {
            match object.get(rule.name) {
                Some(value) => match check_value(&rule.kind, value) {
                    Ok(Some(rewritten)) => {
                        normalized.insert(rule.name.to_string(), rewritten);
                    }
                    Ok(None) => {}
                    Err(messages) => {
                        for message in messages {
                            errors.push(rule.name, message);
                        }
                    }
                },
                None if rule.required => {
                    errors.push(rule.name, "missing required field");
                }
                None => {
                    if let Some(default) = &rule.default {
                        normalized.insert(rule.name.to_string(), default.clone());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(normalized))
        } else {
            Err(errors)
        }
    }

    /// The validated default content document for a block type, used when
    /// inserting a brand-new block. None for unregistered types.
    pub fn default_content(&self, type_name: &str) -> Option<Value> {
        let schema = self.get(type_name)?;

        let mut object = serde_json::Map::new();
        for rule in &schema.fields {
            if let Some(default) = &rule.default {
                object.insert(rule.name.to_string(), default.clone());
            }
        }

        Some(Value::Object(object))
    }
}

/// Check a single present value against a field kind.
///
/// `Ok(Some(value))` means the field is valid but should be stored in the
/// returned rewritten form (currently only rich text sanitization).
fn check_value(kind: &FieldKind, value: &Value) -> Result<Option<Value>, Vec<String>> {
    let mut messages = Vec::new();

    match kind {
        FieldKind::Plain => {
            if !value.is_string() {
                messages.push("must be a string".to_string());
            }
        }
        FieldKind::Rich => match value.as_str() {
            Some(text) => {
                let cleaned = ammonia::clean(text);
                if cleaned != text {
                    return Ok(Some(Value::String(cleaned)));
                }
            }
            None => messages.push("must be a string".to_string()),
        },
        FieldKind::Integer { min, max } => match value.as_i64() {
            Some(n) => {
                if n < *min || n > *max {
                    messages.push(format!("must be between {min} and {max}, got {n}"));
                }
            }
            None => messages.push("must be an integer".to_string()),
        },
        FieldKind::Color => match value.as_str() {
            Some(text) => {
                if !HEX_COLOR.is_match(text) {
                    messages.push("must be a 6-digit hex color like #1a2b3c".to_string());
                }
            }
            None => messages.push("must be a string".to_string()),
        },
        FieldKind::Url => match value.as_str() {
            Some(text) => {
                if !is_safe_url(text) {
                    messages.push("must be an http(s) URL or a site-relative path".to_string());
                }
            }
            None => messages.push("must be a string".to_string()),
        },
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(text) => {
                if !allowed.contains(&text) {
                    messages.push(format!("must be one of: {}", allowed.join(", ")));
                }
            }
            None => messages.push("must be a string".to_string()),
        },
        FieldKind::Boolean => {
            if !value.is_boolean() {
                messages.push("must be a boolean".to_string());
            }
        }
    }

    if messages.is_empty() {
        Ok(None)
    } else {
        Err(messages)
    }
}

/// Accept http(s) URLs, site-relative paths, and the `#` placeholder.
/// Everything else (javascript:, data:, empty) is rejected.
fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.starts_with("https://")
        || trimmed.starts_with("http://")
        || trimmed.starts_with('/')
        || trimmed == "#"
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_all_standard_types() {
        let registry = BlockSchemaRegistry::with_standard_types();
        assert_eq!(registry.len(), 8);

        let expected = [
            "section",
            "container",
            "heading",
            "text",
            "button",
            "image",
            "hero",
            "cta",
        ];
        for name in &expected {
            assert!(
                registry.contains(name),
                "expected block type '{name}' to be registered"
            );
        }
    }

    #[test]
    fn valid_heading_is_accepted() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({
            "text": "Welcome",
            "level": 2,
            "align": "center",
            "color": "#112233"
        });
        let normalized = registry.validate_and_normalize("heading", &content).unwrap();
        assert_eq!(normalized, content);
    }

    #[test]
    fn missing_optional_fields_get_documented_defaults() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Welcome" });
        let normalized = registry.validate_and_normalize("heading", &content).unwrap();

        assert_eq!(normalized["text"], "Welcome");
        assert_eq!(normalized["level"], 2);
        assert_eq!(normalized["align"], "left");
        assert_eq!(normalized["color"], "#111111");
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Welcome" });
        let once = registry.validate_and_normalize("heading", &content).unwrap();
        let twice = registry.validate_and_normalize("heading", &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn cta_non_hex_primary_color_is_rejected_naming_the_field() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({
            "title": "Sign up today",
            "buttonLabel": "Sign up",
            "buttonUrl": "/signup",
            "primaryColor": "red"
        });
        let errors = registry
            .validate_and_normalize("cta", &content)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.first("primaryColor").unwrap().contains("hex color"));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let errors = registry
            .validate_and_normalize("cta", &json!({}))
            .unwrap_err();
        assert_eq!(
            errors.first("title"),
            Some("missing required field")
        );
        assert!(errors.first("buttonLabel").is_some());
        assert!(errors.first("buttonUrl").is_some());
        // Optional fields must not appear in the error map.
        assert!(errors.first("primaryColor").is_none());
        assert!(errors.first("body").is_none());
    }

    #[test]
    fn all_offending_fields_are_reported() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({
            "text": "Title",
            "level": 9,
            "align": "diagonal",
            "color": "blue"
        });
        let errors = registry
            .validate_and_normalize("heading", &content)
            .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.first("level").unwrap().contains("between 1 and 6"));
        assert!(errors.first("align").unwrap().contains("one of"));
        assert!(errors.first("color").unwrap().contains("hex color"));
    }

    #[test]
    fn rich_text_with_disallowed_html_is_sanitized() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Hello <script>alert('xss')</script>" });
        let normalized = registry.validate_and_normalize("text", &content).unwrap();
        let stored = normalized["text"].as_str().unwrap();
        assert!(!stored.contains("<script>"));
        assert!(stored.contains("Hello"));
    }

    #[test]
    fn rich_text_with_safe_inline_html_passes_unchanged() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Hello <b>world</b>" });
        let normalized = registry.validate_and_normalize("text", &content).unwrap();
        assert_eq!(normalized["text"], "Hello <b>world</b>");
    }

    #[test]
    fn plain_ampersand_in_rich_text_is_accepted() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Tom & Jerry" });
        let normalized = registry.validate_and_normalize("heading", &content).unwrap();
        assert_eq!(normalized["text"], "Tom &amp; Jerry");

        // The sanitized form is stable under re-validation.
        let again = registry
            .validate_and_normalize("heading", &normalized)
            .unwrap();
        assert_eq!(again, normalized);
    }

    #[test]
    fn javascript_url_is_rejected() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({
            "label": "Click",
            "url": "javascript:alert('xss')"
        });
        let errors = registry
            .validate_and_normalize("button", &content)
            .unwrap_err();
        assert!(errors.first("url").is_some());
    }

    #[test]
    fn relative_and_absolute_urls_are_accepted() {
        let registry = BlockSchemaRegistry::with_standard_types();
        for url in ["/about", "https://example.com/x", "http://example.com", "#"] {
            let content = json!({ "label": "Go", "url": url });
            assert!(
                registry.validate_and_normalize("button", &content).is_ok(),
                "expected '{url}' to validate"
            );
        }
    }

    #[test]
    fn image_border_width_range() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "url": "/images/a.png", "borderWidth": 11 });
        let errors = registry
            .validate_and_normalize("image", &content)
            .unwrap_err();
        assert!(
            errors
                .first("borderWidth")
                .unwrap()
                .contains("between 0 and 10")
        );
    }

    #[test]
    fn unknown_type_is_fail_open() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "anything": "goes" });
        let normalized = registry
            .validate_and_normalize("carousel", &content)
            .unwrap();
        assert_eq!(normalized, content);
    }

    #[test]
    fn non_object_content_is_rejected() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let errors = registry
            .validate_and_normalize("heading", &json!("just a string"))
            .unwrap_err();
        assert!(errors.first("content").is_some());
    }

    #[test]
    fn extra_unknown_fields_pass_through() {
        let registry = BlockSchemaRegistry::with_standard_types();
        let content = json!({ "text": "Hi", "editorHint": "collapsed" });
        let normalized = registry.validate_and_normalize("text", &content).unwrap();
        assert_eq!(normalized["editorHint"], "collapsed");
    }

    #[test]
    fn default_content_validates_for_every_standard_type() {
        let registry = BlockSchemaRegistry::with_standard_types();
        for type_name in registry.type_names() {
            let content = registry.default_content(&type_name).unwrap();
            let normalized = registry
                .validate_and_normalize(&type_name, &content)
                .unwrap_or_else(|e| panic!("default content for '{type_name}' invalid: {e:?}"));
            assert_eq!(normalized, content, "default content for '{type_name}'");
        }
    }

    #[test]
    fn default_content_for_unknown_type_is_none() {
        let registry = BlockSchemaRegistry::with_standard_types();
        assert!(registry.default_content("carousel").is_none());
    }

    #[test]
    fn empty_registry() {
        let registry = BlockSchemaRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
