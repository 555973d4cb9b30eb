//! Page-builder content document: an arbitrary-depth element tree.
//!
//! The alternative representation for freeform composition. Ownership is a
//! strict tree (children arrays, no parent references), so serialization is
//! direct JSON. Element ids are unique across the whole tree, which makes a
//! flat index over the nested structure possible.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BlockSchemaRegistry, FieldErrors};

/// One node in the page-builder tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default = "empty_object")]
    pub props: Value,
    #[serde(default)]
    pub children: Vec<Element>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The page-builder content document: `{ elements, metadata }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub elements: Vec<Element>,
    pub metadata: DocumentMetadata,
}

impl ContentDocument {
    /// Validate the whole document and return its normalized form.
    ///
    /// Checks that every element id is unique across the entire tree (not
    /// just among siblings) and validates each element's props against the
    /// schema registered for its type. Error paths are of the form
    /// `elements.<id>.<field>`.
    pub fn validate_and_normalize(
        &self,
        registry: &BlockSchemaRegistry,
    ) -> Result<ContentDocument, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.metadata.name.trim().is_empty() {
            errors.push("metadata.name", "must not be empty");
        }

        let mut seen = HashSet::new();
        let elements = self
            .elements
            .iter()
            .map(|element| normalize_element(element, registry, &mut seen, &mut errors))
            .collect();

        if errors.is_empty() {
            Ok(ContentDocument {
                elements,
                metadata: self.metadata.clone(),
            })
        } else {
            Err(errors)
        }
    }

    /// Total number of elements in the tree.
    pub fn element_count(&self) -> usize {
        fn count(elements: &[Element]) -> usize {
            elements
                .iter()
                .map(|e| 1 + count(&e.children))
                .sum()
        }
        count(&self.elements)
    }

    /// Flat id → element index over the nested structure.
    ///
    /// Relies on the tree-wide id uniqueness invariant; on a document that
    /// violates it, later occurrences win.
    pub fn flat_index(&self) -> HashMap<&str, &Element> {
        let mut index = HashMap::new();
        let mut stack: Vec<&Element> = self.elements.iter().collect();
        while let Some(element) = stack.pop() {
            index.insert(element.id.as_str(), element);
            stack.extend(element.children.iter());
        }
        index
    }

    /// Find an element anywhere in the tree by id.
    pub fn find(&self, id: &str) -> Option<&Element> {
        let mut stack: Vec<&Element> = self.elements.iter().collect();
        while let Some(element) = stack.pop() {
            if element.id == id {
                return Some(element);
            }
            stack.extend(element.children.iter());
        }
        None
    }
}

fn normalize_element(
    element: &Element,
    registry: &BlockSchemaRegistry,
    seen: &mut HashSet<String>,
    errors: &mut FieldErrors,
) -> Element {
    if element.id.trim().is_empty() {
        errors.push("elements", "element id must not be empty");
    } else if !seen.insert(element.id.clone()) {
        errors.push(
            format!("elements.{}.id", element.id),
            "duplicate element id",
        );
    }

    let props = match registry.validate_and_normalize(&element.element_type, &element.props) {
        Ok(normalized) => normalized,
        Err(prop_errors) => {
            errors.merge_prefixed(&format!("elements.{}", element.id), prop_errors);
            element.props.clone()
        }
    };

    let children = element
        .children
        .iter()
        .map(|child| normalize_element(child, registry, seen, errors))
        .collect();

    Element {
        id: element.id.clone(),
        element_type: element.element_type.clone(),
        props,
        children,
    }
}
