//! Rendering for page-builder element trees.
//!
//! Walks a [`ContentDocument`] depth-first and reuses the flat block
//! renderers for each node's markup, so an element looks identical whether
//! it arrived as a flat block or as a tree node. Container-ish types wrap
//! their children; leaf types render their children after their own markup,
//! which keeps unexpected nesting visible instead of silently dropping it.

use crate::render::dispatch_with_children;
use crate::schema::document::{ContentDocument, Element};

/// Render a whole document to HTML.
pub fn render_document(document: &ContentDocument) -> String {
    render_elements(&document.elements)
}

fn render_elements(elements: &[Element]) -> String {
    let mut html = String::new();
    for element in elements {
        html.push_str(&render_element(element));
    }
    html
}

fn render_element(element: &Element) -> String {
    let inner = render_elements(&element.children);
    dispatch_with_children(&element.element_type, &element.props, &inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::document::DocumentMetadata;
    use serde_json::{json, Value};

    fn element(id: &str, element_type: &str, props: Value, children: Vec<Element>) -> Element {
        Element {
            id: id.into(),
            element_type: element_type.into(),
            props,
            children,
        }
    }

    fn document(elements: Vec<Element>) -> ContentDocument {
        ContentDocument {
            elements,
            metadata: DocumentMetadata {
                name: "Landing".into(),
                description: None,
            },
        }
    }

    #[test]
    fn section_wraps_its_children() {
        let doc = document(vec![element(
            "root",
            "section",
            json!({ "backgroundColor": "#eeeeee", "padding": 32 }),
            vec![element("h", "heading", json!({ "text": "Inside" }), vec![])],
        )]);

        let html = render_document(&doc);
        assert!(html.starts_with("<section"));
        assert!(html.contains("background-color:#eeeeee"));
        // the heading markup sits inside the section
        let h_pos = html.find("Inside").unwrap();
        let close_pos = html.find("</section>").unwrap();
        assert!(h_pos < close_pos);
    }

    #[test]
    fn container_nested_in_section() {
        let doc = document(vec![element(
            "root",
            "section",
            json!({}),
            vec![element(
                "c",
                "container",
                json!({ "maxWidth": 960 }),
                vec![element("t", "text", json!({ "text": "deep" }), vec![])],
            )],
        )]);

        let html = render_document(&doc);
        assert!(html.contains("max-width:960px"));
        assert!(html.contains("deep"));
        // nesting order: section > container > paragraph
        let section = html.find("<section").unwrap();
        let container = html.find("tpl-container").unwrap();
        let text = html.find("deep").unwrap();
        assert!(section < container && container < text);
    }

    #[test]
    fn sibling_elements_render_in_order() {
        let doc = document(vec![
            element("a", "heading", json!({ "text": "First" }), vec![]),
            element("b", "text", json!({ "text": "Second" }), vec![]),
        ]);

        let html = render_document(&doc);
        assert!(html.find("First").unwrap() < html.find("Second").unwrap());
    }

    #[test]
    fn unknown_element_keeps_children_visible() {
        let doc = document(vec![element(
            "w",
            "widget",
            json!({}),
            vec![element("t", "text", json!({ "text": "still here" }), vec![])],
        )]);

        let html = render_document(&doc);
        assert!(html.contains("block-placeholder"));
        assert!(html.contains("data-type=\"widget\""));
        assert!(html.contains("still here"));
    }

    #[test]
    fn empty_document_renders_to_empty_string() {
        assert_eq!(render_document(&document(vec![])), "");
    }
}
