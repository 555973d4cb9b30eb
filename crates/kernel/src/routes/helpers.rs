//! Shared route helpers.

use tower_sessions::Session;
use uuid::Uuid;

use crate::models::User;
use crate::state::AppState;

/// Session key for user ID.
const SESSION_USER_ID: &str = "user_id";

/// Resolve the session to a user, if any.
///
/// Returns `None` for anonymous sessions, unknown user ids, and blocked
/// accounts alike; the editor pipeline turns that into a 401 where
/// authentication is required.
pub async fn current_user(state: &AppState, session: &Session) -> Option<User> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    let user = User::find_by_id(state.db(), user_id?).await.ok()??;

    user.is_active().then_some(user)
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape_special_chars() {
        assert_eq!(
            html_escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_html_escape_ampersand() {
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }

    #[test]
    fn test_html_escape_quotes() {
        assert_eq!(html_escape(r#"say "hello""#), "say &quot;hello&quot;");
    }

    #[test]
    fn test_html_escape_plain_text() {
        assert_eq!(html_escape("hello world"), "hello world");
    }

    #[test]
    fn test_html_escape_empty() {
        assert_eq!(html_escape(""), "");
    }
}
