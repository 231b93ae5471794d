use crate::constants::MAX_SESSION_ID_LEN;

/// Returns `true` for characters allowed in a session id: `[A-Za-z0-9_-]`.
pub fn is_session_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Strips every disallowed character and truncates to the backend limit.
///
/// The result may be empty, in which case no connection should be attempted.
pub fn sanitize_session_id(raw: &str) -> String {
    raw.chars()
        .filter(|&c| is_session_id_char(c))
        .take(MAX_SESSION_ID_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_session_id("chat_01-main"), "chat_01-main");
    }

    #[test]
    fn sanitize_strips_query_injection() {
        assert_eq!(sanitize_session_id("abc&admin=1#x"), "abcadmin1x");
        assert_eq!(sanitize_session_id("../../etc"), "etc");
        assert_eq!(sanitize_session_id("sess ión"), "sessin");
    }

    #[test]
    fn sanitize_truncates_to_limit() {
        let long = "a".repeat(MAX_SESSION_ID_LEN + 20);
        assert_eq!(sanitize_session_id(&long).len(), MAX_SESSION_ID_LEN);
    }

    #[test]
    fn sanitize_may_yield_empty() {
        assert_eq!(sanitize_session_id("!!!"), "");
        assert_eq!(sanitize_session_id(""), "");
    }

    #[test]
    fn allowed_characters() {
        assert!(is_session_id_char('a'));
        assert!(is_session_id_char('_'));
        assert!(!is_session_id_char(' '));
        assert!(!is_session_id_char('&'));
    }
}
