//! Inline comment-markup removal
//!
//! Review tooling wraps commented passages in custom inline tags. Three
//! families exist, each with `-start`/`-end` variants that appear both
//! self-closing and as open/close pairs:
//!
//! ```text
//! <comment-start name="a">text</comment-start>
//! <resolvedcomment-end name="b"/>
//! <commentplaceholder-start></commentplaceholder-start>
//! ```
//!
//! Stripping removes the tags and keeps the wrapped content verbatim.

use regex::Regex;

pub struct CommentMarkupStripper {
    tags: Regex,
}

impl CommentMarkupStripper {
    pub fn new() -> Self {
        // The pattern is static and known-valid.
        let tags = Regex::new(
            r"</?(?:comment|resolvedcomment|commentplaceholder)-(?:start|end)(?:\s[^>]*)?/?>",
        )
        .expect("valid comment-markup pattern");
        Self { tags }
    }

    pub fn strip(&self, html: &str) -> String {
        self.tags.replace_all(html, "").into_owned()
    }
}

impl Default for CommentMarkupStripper {
    fn default() -> Self {
        Self::new()
    }
}
