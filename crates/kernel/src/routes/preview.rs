//! Rendered template pages: the public preview and the editing canvas.

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::EditorResult;
use crate::routes::helpers::{current_user, html_escape};
use crate::state::AppState;

/// GET /templates/{id}/preview — public rendered view, active blocks only.
async fn preview(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> EditorResult<Html<String>> {
    let body = state.editor().render_preview(template_id).await?;

    Ok(Html(page_shell("Preview", &body)))
}

/// GET /templates/{id}/canvas — editing view, inactive blocks dimmed.
async fn canvas(
    State(state): State<AppState>,
    session: Session,
    Path(template_id): Path<Uuid>,
) -> EditorResult<Html<String>> {
    let user = current_user(&state, &session).await;

    let body = state
        .editor()
        .render_canvas(user.as_ref(), template_id)
        .await?;

    Ok(Html(page_shell("Canvas", &body)))
}

/// Minimal document wrapper around rendered block markup.
fn page_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
</head>
<body>
{body}
</body>
</html>"#,
        html_escape(title)
    )
}

/// Create the preview/canvas router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/templates/{id}/preview", get(preview))
        .route("/templates/{id}/canvas", get(canvas))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shell_wraps_body_and_escapes_title() {
        let html = page_shell("A <b> title", "<p>content</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt; title</title>"));
        assert!(html.contains("<p>content</p>"));
    }
}
