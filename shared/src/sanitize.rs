use anyhow::{Context, Result};
use regex::Regex;

// `<a ... class="at" ...>@Name</a>` in any attribute order, either quote
// style, shortest span up to the first closing tag.
const REPLY_MARKER_PATTERN: &str =
    r#"(?is)<a\s(?:[^>]*?\s)?class\s*=\s*(?:"at"|'at')[^>]*>.*?</a\s*>"#;

/// Separator the comment widget renders after a reply marker.
pub const REPLY_SEPARATOR: &str = " , ";

/// Strips rendered reply markers out of comment bodies.
pub struct BodySanitizer {
    reply_marker: Regex,
}

impl BodySanitizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            reply_marker: Regex::new(REPLY_MARKER_PATTERN).context("invalid reply marker regex")?,
        })
    }

    /// Remove every reply marker anchor and every `" , "` separator.
    ///
    /// Runs until nothing changes: removing one fragment can join its
    /// neighbours into a new separator.
    pub fn clean(&self, body: &str) -> String {
        let mut current = body.to_string();
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, body: &str) -> String {
        self.reply_marker
            .replace_all(body, "")
            .replace(REPLY_SEPARATOR, "")
    }
}
