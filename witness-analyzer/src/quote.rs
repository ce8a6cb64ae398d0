//! Quoted-span extraction (Unicode-safe).

use witness_core::TextSpan;

/// Widen `span` by up to `context_chars` characters on each side and return
/// the covered text with its span.
///
/// The result is always a substring of `text`. A span that does not fall on
/// char boundaries yields an empty quote at `span.start`.
pub fn quote_with_context(text: &str, span: TextSpan, context_chars: usize) -> (String, TextSpan) {
    let (Some(before), Some(after)) = (text.get(..span.start), text.get(span.end..)) else {
        return (String::new(), TextSpan::new(span.start, span.start));
    };
    if span.start > span.end {
        return (String::new(), TextSpan::new(span.start, span.start));
    }

    let start = before
        .char_indices()
        .rev()
        .take(context_chars)
        .last()
        .map_or(span.start, |(i, _)| i);

    let end = after
        .char_indices()
        .nth(context_chars)
        .map_or(text.len(), |(i, _)| span.end + i);

    let widened = TextSpan::new(start, end);
    (text[start..end].to_string(), widened)
}

/// Exact text of `span`, or empty if it does not fall on char boundaries.
pub fn quote_exact(text: &str, span: TextSpan) -> String {
    text.get(span.start..span.end).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_context_returns_match() {
        let text = "I ran the script yesterday";
        let (quote, span) = quote_with_context(text, TextSpan::new(2, 16), 0);
        assert_eq!(quote, "ran the script");
        assert_eq!(span, TextSpan::new(2, 16));
    }

    #[test]
    fn test_context_clips_to_text() {
        let text = "ab MATCH cd";
        let (quote, span) = quote_with_context(text, TextSpan::new(3, 8), 2);
        assert_eq!(quote, "b MATCH c");
        assert_eq!(span, TextSpan::new(1, 10));

        let (quote, span) = quote_with_context(text, TextSpan::new(3, 8), 100);
        assert_eq!(quote, text);
        assert_eq!(span, TextSpan::new(0, text.len()));
    }

    #[test]
    fn test_context_counts_chars_not_bytes() {
        let text = "ééé MATCH ééé";
        let start = text.find("MATCH").unwrap();
        let span = TextSpan::new(start, start + 5);
        let (quote, _) = quote_with_context(text, span, 2);
        assert_eq!(quote, "é MATCH é");
    }

    #[test]
    fn test_non_boundary_span_is_empty() {
        let text = "é";
        let (quote, span) = quote_with_context(text, TextSpan::new(1, 2), 3);
        assert!(quote.is_empty());
        assert_eq!(span, TextSpan::new(1, 1));
        assert_eq!(quote_exact(text, TextSpan::new(1, 2)), "");
        assert_eq!(quote_exact(text, TextSpan::new(0, 2)), "é");
    }
}
