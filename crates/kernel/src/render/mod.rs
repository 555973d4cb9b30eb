//! Server-side block rendering.
//!
//! Maps a stored block's type to a presentation function producing HTML.
//! The same dispatch serves the editing canvas and the public preview, so
//! the two stay visually identical; the canvas additionally wraps blocks in
//! editor markers and keeps inactive blocks visible but dimmed.
//!
//! Rendering never mutates content. Unknown types render a neutral
//! placeholder instead of erroring, so one malformed or future block type
//! cannot break the whole page.

pub mod element;

use serde_json::Value;

use crate::models::Block;
use crate::routes::helpers::html_escape;

/// Which surface is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Editing canvas: all blocks, inactive ones dimmed, wrapped in
    /// editor markers.
    Canvas,
    /// Public preview: active blocks only, bare markup.
    Preview,
}

/// Render a template's blocks into a single HTML string.
pub fn render_blocks(blocks: &[Block], mode: RenderMode) -> String {
    let mut html = String::new();
    for block in blocks {
        if !block.is_active && mode == RenderMode::Preview {
            continue;
        }

        let rendered = dispatch(&block.block_type, &block.content);

        match mode {
            RenderMode::Preview => html.push_str(&rendered),
            RenderMode::Canvas => {
                let dimmed = if block.is_active { "" } else { " canvas-block-inactive" };
                html.push_str(&format!(
                    "<div class=\"canvas-block{dimmed}\" data-block-id=\"{}\" data-type=\"{}\">{rendered}</div>",
                    block.id,
                    html_escape(&block.block_type),
                ));
            }
        }
    }
    html
}

/// Map a block/element type to its renderer. `inner` is pre-rendered child
/// markup (empty for the flat block model; the page-builder tree passes
/// rendered children for container-ish types).
pub(crate) fn dispatch(block_type: &str, content: &Value) -> String {
    dispatch_with_children(block_type, content, "")
}

pub(crate) fn dispatch_with_children(block_type: &str, content: &Value, inner: &str) -> String {
    match block_type {
        "section" => render_section(content, inner),
        "container" => render_container(content, inner),
        "heading" => render_heading(content),
        "text" => render_text(content),
        "button" => render_button(content),
        "image" => render_image(content),
        "hero" => render_hero(content),
        "cta" => render_cta(content),
        _ => render_placeholder(block_type, inner),
    }
}

/// Sanitize user-provided rich text, allowing only safe inline HTML.
fn sanitize_text(input: &str) -> String {
    ammonia::clean(input)
}

fn str_field<'a>(content: &'a Value, field: &str, default: &'a str) -> &'a str {
    content.get(field).and_then(|v| v.as_str()).unwrap_or(default)
}

fn int_field(content: &Value, field: &str, default: i64) -> i64 {
    content.get(field).and_then(|v| v.as_i64()).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Individual renderers
// ---------------------------------------------------------------------------

/// Content: `{ "backgroundColor": "#ffffff", "padding": 24 }`
fn render_section(content: &Value, inner: &str) -> String {
    let background = html_escape(str_field(content, "backgroundColor", "#ffffff"));
    let padding = int_field(content, "padding", 24);
    format!(
        "<section class=\"tpl-section\" style=\"background-color:{background};padding:{padding}px\">{inner}</section>"
    )
}

/// Content: `{ "maxWidth": 1140, "padding": 16 }`
fn render_container(content: &Value, inner: &str) -> String {
    let max_width = int_field(content, "maxWidth", 1140);
    let padding = int_field(content, "padding", 16);
    format!(
        "<div class=\"tpl-container\" style=\"max-width:{max_width}px;margin:0 auto;padding:{padding}px\">{inner}</div>"
    )
}

/// Content: `{ "text": "...", "level": 2, "align": "left", "color": "#111111" }`
fn render_heading(content: &Value) -> String {
    let text = sanitize_text(str_field(content, "text", ""));
    let level = int_field(content, "level", 2).clamp(1, 6);
    let align = html_escape(str_field(content, "align", "left"));
    let color = html_escape(str_field(content, "color", "#111111"));
    format!("<h{level} style=\"text-align:{align};color:{color}\">{text}</h{level}>")
}

/// Content: `{ "text": "...", "align": "left", "color": "#333333" }`
fn render_text(content: &Value) -> String {
    let text = sanitize_text(str_field(content, "text", ""));
    let align = html_escape(str_field(content, "align", "left"));
    let color = html_escape(str_field(content, "color", "#333333"));
    format!("<p style=\"text-align:{align};color:{color}\">{text}</p>")
}

/// Content: `{ "label": "...", "url": "...", "variant": "primary", "backgroundColor": "#2563eb" }`
fn render_button(content: &Value) -> String {
    let label = html_escape(str_field(content, "label", ""));
    let url = html_escape(str_field(content, "url", "#"));
    let variant = html_escape(str_field(content, "variant", "primary"));
    let background = html_escape(str_field(content, "backgroundColor", "#2563eb"));
    format!(
        "<a class=\"btn btn-{variant}\" href=\"{url}\" style=\"background-color:{background}\">{label}</a>"
    )
}

/// Content: `{ "url": "...", "alt": "...", "caption": "...", "borderWidth": 0 }`
fn render_image(content: &Value) -> String {
    let url = html_escape(str_field(content, "url", ""));
    let alt = html_escape(str_field(content, "alt", ""));
    let border = int_field(content, "borderWidth", 0);
    let caption = str_field(content, "caption", "");

    let mut html = format!(
        "<figure><img src=\"{url}\" alt=\"{alt}\" style=\"border-width:{border}px\">"
    );
    if !caption.is_empty() {
        html.push_str(&format!("<figcaption>{}</figcaption>", html_escape(caption)));
    }
    html.push_str("</figure>");
    html
}

/// Content: `{ "title", "subtitle"?, "imageUrl"?, "backgroundColor", "padding" }`
fn render_hero(content: &Value) -> String {
    let title = html_escape(str_field(content, "title", ""));
    let background = html_escape(str_field(content, "backgroundColor", "#0f172a"));
    let padding = int_field(content, "padding", 64);

    let mut html = format!(
        "<header class=\"hero\" style=\"background-color:{background};padding:{padding}px\"><h1>{title}</h1>"
    );
    let subtitle = str_field(content, "subtitle", "");
    if !subtitle.is_empty() {
        html.push_str(&format!("<p class=\"hero-subtitle\">{}</p>", html_escape(subtitle)));
    }
    let image_url = str_field(content, "imageUrl", "");
    if !image_url.is_empty() {
        html.push_str(&format!(
            "<img class=\"hero-image\" src=\"{}\" alt=\"\">",
            html_escape(image_url)
        ));
    }
    html.push_str("</header>");
    html
}

/// Content: `{ "title", "body"?, "buttonLabel", "buttonUrl", "primaryColor" }`
fn render_cta(content: &Value) -> String {
    let title = html_escape(str_field(content, "title", ""));
    let label = html_escape(str_field(content, "buttonLabel", ""));
    let url = html_escape(str_field(content, "buttonUrl", "#"));
    let color = html_escape(str_field(content, "primaryColor", "#2563eb"));

    let mut html = format!(
        "<div class=\"cta\" style=\"border-color:{color}\"><h2>{title}</h2>"
    );
    let body = str_field(content, "body", "");
    if !body.is_empty() {
        html.push_str(&format!("<p>{}</p>", sanitize_text(body)));
    }
    html.push_str(&format!(
        "<a class=\"btn btn-primary\" href=\"{url}\" style=\"background-color:{color}\">{label}</a></div>"
    ));
    html
}

/// Neutral placeholder for unknown types. Children (if any) still render
/// inside, so a future container type degrades gracefully.
fn render_placeholder(block_type: &str, inner: &str) -> String {
    format!(
        "<div class=\"block-placeholder\" data-type=\"{}\">{inner}</div>",
        html_escape(block_type)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn make_block(block_type: &str, content: Value, is_active: bool) -> Block {
        Block {
            id: Uuid::now_v7(),
            template_id: Uuid::nil(),
            block_type: block_type.into(),
            content,
            sort_order: 0,
            is_active,
            created: Utc::now(),
            changed: Utc::now(),
        }
    }

    #[test]
    fn heading_renders_level_and_styles() {
        let html = dispatch(
            "heading",
            &json!({ "text": "Welcome", "level": 3, "align": "center", "color": "#112233" }),
        );
        assert_eq!(
            html,
            "<h3 style=\"text-align:center;color:#112233\">Welcome</h3>"
        );
    }

    #[test]
    fn heading_clamps_out_of_range_level() {
        let html = dispatch("heading", &json!({ "text": "Hi", "level": 9 }));
        assert!(html.starts_with("<h6"));
    }

    #[test]
    fn text_strips_script_tags() {
        let html = dispatch(
            "text",
            &json!({ "text": "Hello <script>alert('xss')</script> world" }),
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("Hello"));
        assert!(html.contains("world"));
    }

    #[test]
    fn text_preserves_safe_inline_html() {
        let html = dispatch("text", &json!({ "text": "This is <b>bold</b>." }));
        assert!(html.contains("<b>bold</b>"));
    }

    #[test]
    fn button_escapes_label_and_url() {
        let html = dispatch(
            "button",
            &json!({ "label": "Go <fast>", "url": "/x?a=1&b=2", "variant": "outline" }),
        );
        assert!(html.contains("btn-outline"));
        assert!(html.contains("href=\"/x?a=1&amp;b=2\""));
        assert!(html.contains("Go &lt;fast&gt;"));
    }

    #[test]
    fn image_renders_figure_with_optional_caption() {
        let html = dispatch(
            "image",
            &json!({ "url": "/img/a.png", "alt": "A", "caption": "Cap", "borderWidth": 2 }),
        );
        assert!(html.starts_with("<figure>"));
        assert!(html.contains("src=\"/img/a.png\""));
        assert!(html.contains("border-width:2px"));
        assert!(html.contains("<figcaption>Cap</figcaption>"));

        let bare = dispatch("image", &json!({ "url": "/img/a.png" }));
        assert!(!bare.contains("figcaption"));
    }

    #[test]
    fn hero_renders_subtitle_and_image_only_when_present() {
        let full = dispatch(
            "hero",
            &json!({ "title": "Big", "subtitle": "Small", "imageUrl": "/i.png" }),
        );
        assert!(full.contains("<h1>Big</h1>"));
        assert!(full.contains("hero-subtitle"));
        assert!(full.contains("hero-image"));

        let bare = dispatch("hero", &json!({ "title": "Big" }));
        assert!(!bare.contains("hero-subtitle"));
        assert!(!bare.contains("hero-image"));
    }

    #[test]
    fn cta_renders_button_with_primary_color() {
        let html = dispatch(
            "cta",
            &json!({
                "title": "Join",
                "buttonLabel": "Sign up",
                "buttonUrl": "/signup",
                "primaryColor": "#ff0000"
            }),
        );
        assert!(html.contains("<h2>Join</h2>"));
        assert!(html.contains("background-color:#ff0000"));
        assert!(html.contains("href=\"/signup\""));
    }

    #[test]
    fn unknown_type_renders_neutral_placeholder() {
        let html = dispatch("carousel", &json!({ "whatever": 1 }));
        assert_eq!(
            html,
            "<div class=\"block-placeholder\" data-type=\"carousel\"></div>"
        );
    }

    #[test]
    fn placeholder_escapes_the_type_name() {
        let html = dispatch("<evil>", &json!({}));
        assert!(!html.contains("<evil>"));
        assert!(html.contains("&lt;evil&gt;"));
    }

    #[test]
    fn preview_filters_inactive_blocks() {
        let blocks = vec![
            make_block("heading", json!({ "text": "Visible" }), true),
            make_block("text", json!({ "text": "Hidden" }), false),
        ];
        let html = render_blocks(&blocks, RenderMode::Preview);
        assert!(html.contains("Visible"));
        assert!(!html.contains("Hidden"));
    }

    #[test]
    fn canvas_keeps_inactive_blocks_dimmed() {
        let blocks = vec![
            make_block("heading", json!({ "text": "Visible" }), true),
            make_block("text", json!({ "text": "Hidden" }), false),
        ];
        let html = render_blocks(&blocks, RenderMode::Canvas);
        assert!(html.contains("Visible"));
        assert!(html.contains("Hidden"));
        assert!(html.contains("canvas-block-inactive"));
    }

    #[test]
    fn canvas_and_preview_share_block_markup() {
        let block = make_block(
            "heading",
            json!({ "text": "Same", "level": 2, "align": "left", "color": "#111111" }),
            true,
        );
        let preview = render_blocks(std::slice::from_ref(&block), RenderMode::Preview);
        let canvas = render_blocks(std::slice::from_ref(&block), RenderMode::Canvas);
        // the canvas wrapper contains the preview markup verbatim
        assert!(canvas.contains(&preview));
    }

    #[test]
    fn rendering_does_not_mutate_content() {
        let content = json!({ "text": "Hi <b>there</b>" });
        let before = content.clone();
        let _ = dispatch("text", &content);
        assert_eq!(content, before);
    }
}
