//! URL derivation from the configured host.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use companion_protocol::constants::{HEALTH_PATH, WS_CHAT_PATH, WS_SESSION_QUERY};

/// Characters left unescaped in a query value (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Splits `url` into its lowercase scheme and the remainder, if it has one.
fn split_scheme(url: &str) -> Option<(String, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    Some((scheme.to_ascii_lowercase(), rest))
}

/// WebSocket form of `host_url`: `https` becomes `wss`, `http` becomes `ws`,
/// `ws`/`wss` are kept and a bare host gets `ws://`. Trailing slashes are
/// removed.
pub fn websocket_base(host_url: &str) -> String {
    let host = host_url.trim().trim_end_matches('/');
    match split_scheme(host) {
        Some((scheme, rest)) => match scheme.as_str() {
            "https" | "wss" => format!("wss://{rest}"),
            _ => format!("ws://{rest}"),
        },
        None => format!("ws://{host}"),
    }
}

/// HTTP form of `host_url`, the inverse rewrite of [`websocket_base`].
pub fn http_base(host_url: &str) -> String {
    let host = host_url.trim().trim_end_matches('/');
    match split_scheme(host) {
        Some((scheme, rest)) => match scheme.as_str() {
            "https" | "wss" => format!("https://{rest}"),
            _ => format!("http://{rest}"),
        },
        None => format!("http://{host}"),
    }
}

/// `<ws base>/ws/chat?session_id=<percent-encoded id>`.
pub fn connection_url(host_url: &str, session_id: &str) -> String {
    format!(
        "{}{WS_CHAT_PATH}?{WS_SESSION_QUERY}={}",
        websocket_base(host_url),
        utf8_percent_encode(session_id, QUERY_VALUE)
    )
}

/// `<http base>/health`.
pub fn health_url(host_url: &str) -> String {
    format!("{}{HEALTH_PATH}", http_base(host_url))
}
