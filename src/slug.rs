//! Title-to-slug resolution.
//!
//! The slug is the only identity used for linking, equality and URL
//! addressing. Two notes whose titles normalize to the same slug collide as
//! the same graph node, matching wiki conventions. Every consumer must go
//! through this function; the mapping is deterministic and never hashed.

/// Convert a human title into a URL-safe slug.
///
/// Trims, lowercases, turns whitespace runs into `-`, drops every character
/// that is not a Unicode letter, digit or hyphen, collapses repeated hyphens
/// and strips them from both ends. Always returns a string; a title made of
/// pure punctuation yields an empty slug.
pub fn title_to_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_hyphen = false;

    for ch in title.trim().chars() {
        let mapped = if ch.is_whitespace() { '-' } else { ch };
        if mapped == '-' {
            if !prev_hyphen && !slug.is_empty() {
                slug.push('-');
                prev_hyphen = true;
            }
            continue;
        }
        if mapped.is_alphabetic() || mapped.is_numeric() {
            for lower in mapped.to_lowercase() {
                slug.push(lower);
            }
            prev_hyphen = false;
        }
        // Anything else (punctuation, symbols) is dropped.
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ascii() {
        assert_eq!(title_to_slug("Hello World"), "hello-world");
        assert_eq!(title_to_slug("  Rust Notes  "), "rust-notes");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(title_to_slug("a   b\t\tc"), "a-b-c");
    }

    #[test]
    fn test_punctuation_is_dropped() {
        assert_eq!(title_to_slug("What's up?"), "whats-up");
        assert_eq!(title_to_slug("C++ / Rust!"), "c-rust");
    }

    #[test]
    fn test_pure_punctuation_yields_empty() {
        assert_eq!(title_to_slug("!?!"), "");
        assert_eq!(title_to_slug("---"), "");
    }

    #[test]
    fn test_japanese_titles_keep_their_characters() {
        let slug = title_to_slug("  日記 2025  ");
        assert_eq!(slug, "日記-2025");
        assert!(!slug.contains(' '));
    }

    #[test]
    fn test_stable_and_trim_equivalent() {
        let s = " Mixed 日本語 Title ";
        assert_eq!(title_to_slug(s), title_to_slug(s));
        assert_eq!(title_to_slug(s), title_to_slug(s.trim()));
    }

    #[test]
    fn test_hyphens_collapse_and_trim() {
        assert_eq!(title_to_slug("- a -- b -"), "a-b");
    }
}
