//! Block content schemas: per-type validation and defaulting rules.
//!
//! The registry is the single source of truth for what a block's content may
//! contain. Validation is pure — no I/O, deterministic — so it can run the
//! same way in the save pipeline and in tests.

pub mod document;
pub mod registry;

use std::collections::BTreeMap;

use serde::Serialize;

pub use document::{ContentDocument, DocumentMetadata, Element};
pub use registry::{BlockSchema, BlockSchemaRegistry, FieldKind, FieldRule};

/// Field-path → messages map describing a validation failure.
///
/// Every offending field is named; the first message per path is the one
/// surfaced as the primary error, the rest remain available for UI display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field path.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    /// Merge another error map into this one, prefixing its paths.
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (path, messages) in other.0 {
            let full = if path.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{path}")
            };
            self.0.entry(full).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// All messages recorded for a field path.
    pub fn messages(&self, path: &str) -> &[String] {
        self.0.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The primary (first) message for a field path.
    pub fn first(&self, path: &str) -> Option<&str> {
        self.0.get(path).and_then(|m| m.first()).map(String::as_str)
    }

    /// The primary message per field path.
    pub fn primary(&self) -> BTreeMap<&str, &str> {
        self.0
            .iter()
            .filter_map(|(path, messages)| {
                messages.first().map(|m| (path.as_str(), m.as_str()))
            })
            .collect()
    }

    /// Iterate over all (path, messages) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_path_is_primary() {
        let mut errors = FieldErrors::new();
        errors.push("color", "must be a hex color");
        errors.push("color", "must not be empty");
        errors.push("padding", "must be between 0 and 100");

        assert_eq!(errors.first("color"), Some("must be a hex color"));
        assert_eq!(errors.messages("color").len(), 2);
        assert_eq!(errors.primary().len(), 2);
    }

    #[test]
    fn merge_prefixed_builds_full_paths() {
        let mut inner = FieldErrors::new();
        inner.push("level", "must be between 1 and 6");

        let mut outer = FieldErrors::new();
        outer.merge_prefixed("elements.abc", inner);

        assert_eq!(
            outer.first("elements.abc.level"),
            Some("must be between 1 and 6")
        );
    }
}
