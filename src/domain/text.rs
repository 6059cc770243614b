use std::borrow::Cow;

/// Marker appended when text is cut down to a character budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Caps `text` at `max_chars` characters, replacing the tail with
/// [`TRUNCATION_MARKER`] so the result stays within the budget (budgets
/// smaller than the marker itself degenerate to the bare marker). Used for
/// everything handed to the embedding and completion providers.
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        None => Cow::Borrowed(text),
        Some(_) => {
            let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
            let cut = text
                .char_indices()
                .nth(keep)
                .map(|(at, _)| at)
                .unwrap_or(0);
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert!(matches!(truncate_chars("hello", 10), Cow::Borrowed("hello")));
        assert_eq!(truncate_chars("hello", 5).as_ref(), "hello");
    }

    #[test]
    fn test_long_text_cut_with_marker() {
        let out = truncate_chars("abcdefghij", 8);
        assert_eq!(out.as_ref(), "abcde...");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn test_respects_char_boundaries() {
        let text = "αβγδεζηθικ";
        let out = truncate_chars(text, 7);
        assert_eq!(out.chars().count(), 7);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_tiny_budget_degenerates_to_marker() {
        assert_eq!(truncate_chars("abcdef", 3).as_ref(), "...");
        assert_eq!(truncate_chars("abcdef", 2).as_ref(), "...");
    }
}
