use anyhow::{Context, Result};
use regex::Regex;

use crate::{identity::IdentityMap, CommentId, TOP_LEVEL_PARENT};

// Attribute scan, not an HTML parse: exported bodies are not guaranteed to be
// well-formed. Either quote style; `[^"]`/`[^']` also cross newlines.
const HREF_PATTERN: &str = r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

/// Prefix of a same-page link pointing at another comment.
pub const REPLY_ANCHOR_PREFIX: char = '#';

pub struct ReplyLinkExtractor {
    href: Regex,
}

impl ReplyLinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            href: Regex::new(HREF_PATTERN).context("invalid href regex")?,
        })
    }

    /// Every href target in the body, in document order.
    pub fn link_targets<'a>(&self, body: &'a str) -> Vec<&'a str> {
        self.href
            .captures_iter(body)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|target| target.as_str())
            .collect()
    }

    /// External ids referenced through `#<id>` targets, in document order.
    pub fn reply_candidates<'a>(&self, body: &'a str) -> Vec<&'a str> {
        self.link_targets(body)
            .into_iter()
            .filter_map(|target| target.strip_prefix(REPLY_ANCHOR_PREFIX))
            .collect()
    }

    /// Destination id of the comment this body replies to.
    ///
    /// The last candidate that is already in `identity` wins; with none, the
    /// comment is top-level.
    pub fn resolve_parent(&self, body: &str, identity: &IdentityMap) -> CommentId {
        let mut parent_id = TOP_LEVEL_PARENT;
        for external_id in self.reply_candidates(body) {
            match identity.resolve(external_id) {
                Some(resolved) => parent_id = resolved,
                None => tracing::debug!("reply target #{external_id} not inserted yet"),
            }
        }
        parent_id
    }
}
