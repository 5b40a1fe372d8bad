//! # Sanitizer
//!
//! The two escaping functions the renderer is allowed to use. They are not
//! interchangeable:
//!
//! - [`escape_text`] is for text between tags (`<`, `>`, `&`)
//! - [`escape_attribute`] is for attribute values (the above plus `"` and `'`)
//!
//! URLs that end up in `href` additionally pass through [`sanitize_url`],
//! which rejects script-capable protocols.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Protocols that are never emitted in an `href`.
const BLOCKED_PROTOCOLS: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Escapes `<`, `>` and `&` for use as element text content.
///
/// Quotes are left alone, so this must never be used for attribute values.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escapes `<`, `>`, `&`, `"` and `'` for use inside a quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(value)
}

/// Returns the URL unchanged if it is safe to put in an `href`, `None` otherwise.
///
/// The protocol check runs on the percent-decoded URL with everything but
/// alphanumerics, `/` and `:` stripped, so `java%0Ascript:` and
/// `JaVa Script:` are caught too. URLs that do not decode are rejected.
pub fn sanitize_url(url: &str) -> Option<&str> {
    let decoded = percent_decode_str(url).decode_utf8().ok()?;
    let protocol: String = decoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '/' || *c == ':')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if BLOCKED_PROTOCOLS.iter().any(|p| protocol.starts_with(p)) {
        None
    } else {
        Some(url)
    }
}

/// Removes backslash escapes in front of ASCII punctuation in a link target.
pub fn unescape_url(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && is_escapable(next)
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Characters a backslash may escape: anything that is not alphanumeric or whitespace.
pub(crate) fn is_escapable(c: char) -> bool {
    !c.is_ascii_alphanumeric() && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_escapes_angle_brackets_and_ampersand() {
        assert_eq!(escape_text("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn text_leaves_quotes_alone() {
        assert_eq!(escape_text(r#"say "hi" it's"#), r#"say "hi" it's"#);
    }

    #[test]
    fn attribute_escapes_quotes() {
        let escaped = escape_attribute(r#"a"b'c<d>&"#);
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert!(escaped.starts_with("a&quot;b"));
        assert!(escaped.ends_with("&lt;d&gt;&amp;"));
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn safe_urls_pass_through() {
        assert_eq!(
            sanitize_url("https://example.com/a?b=c"),
            Some("https://example.com/a?b=c")
        );
        assert_eq!(sanitize_url("/relative/path"), Some("/relative/path"));
    }

    #[test]
    fn script_urls_are_rejected() {
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
        assert_eq!(sanitize_url("JavaScript:alert(1)"), None);
        assert_eq!(sanitize_url("java%0Ascript:alert(1)"), None);
        assert_eq!(sanitize_url(" vbscript:msgbox"), None);
        assert_eq!(sanitize_url("data:text/html;base64,xyz"), None);
    }

    #[test]
    fn undecodable_urls_are_rejected() {
        assert_eq!(sanitize_url("http://x/%FF%FE"), None);
    }

    #[test]
    fn unescape_url_drops_punctuation_escapes_only() {
        assert_eq!(unescape_url(r"http://x/a\_b"), "http://x/a_b");
        assert_eq!(unescape_url(r"http://x/a\b"), r"http://x/a\b");
        assert_eq!(unescape_url(r"trailing\"), r"trailing\");
    }
}
