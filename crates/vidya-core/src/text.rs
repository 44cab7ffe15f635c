//! Small string helpers shared by logging and prompt construction.
//!
//! All lengths are counted in `char`s so truncation never splits a UTF-8
//! sequence.

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Return the first `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate to `max_chars` and append [`ELLIPSIS`] when anything was cut.
///
/// Text at or under the limit is returned unchanged.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let cut = truncate_chars(s, max_chars);
    if cut.len() == s.len() {
        s.to_string()
    } else {
        format!("{cut}{ELLIPSIS}")
    }
}

/// Short single-line rendering of `s` for log fields.
pub fn preview(s: &str, max_chars: usize) -> String {
    truncate_with_ellipsis(&s.replace(['\n', '\r'], " "), max_chars)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_is_identity() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }

    #[test]
    fn truncate_long_appends_marker() {
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abcd...");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "विद्या योजना";
        let cut = truncate_chars(s, 3);
        assert_eq!(cut.chars().count(), 3);
        assert!(s.starts_with(cut));
    }

    #[test]
    fn preview_flattens_newlines() {
        assert_eq!(preview("a\nb\r\nc", 100), "a b  c");
    }

    #[test]
    fn collapse_whitespace_trims_and_joins() {
        assert_eq!(collapse_whitespace("  Class \n X\tScience  "), "Class X Science");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
