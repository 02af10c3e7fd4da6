//! HTML escaping helpers.

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a value placed inside a double-quoted attribute.
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Inline diagnostic shown in place of content that could not be produced.
///
/// `--` is not allowed inside an HTML comment, so it is broken up.
pub fn diagnostic(message: &str) -> String {
    format!("<!-- {} -->\n", message.replace("--", "- -"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_diagnostic() {
        assert_eq!(diagnostic("not found: x"), "<!-- not found: x -->\n");
        assert_eq!(diagnostic("a--b"), "<!-- a- -b -->\n");
    }
}
