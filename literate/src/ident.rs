//! Identifiers for code blocks (`#id` in the meta string) and headings
//! (kebab-case slug of the heading text).

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{CodeBlockNode, HeadingNode};

static CODE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([A-Za-z0-9_-]+)(?:$|\s)").expect("code id pattern compiles")
});

/// The first `#id` token of the block's meta string.
pub fn code_id(code: &CodeBlockNode) -> Option<&str> {
    let meta = code.meta.as_deref()?;
    CODE_ID
        .captures(meta)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The slug of the heading's literal text. `None` when the heading has no
/// literal text; the slug itself may be empty when nothing survives.
pub fn heading_id(heading: &HeadingNode) -> Option<String> {
    heading.text.as_deref().map(slugify)
}

/// Lowercase, drop everything but `[a-z0-9]`, whitespace and `-`, turn
/// whitespace runs into single hyphens, squeeze hyphens, trim hyphens.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.split_whitespace().collect::<Vec<_>>().join("-").chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.trim_matches('-').to_string()
}
