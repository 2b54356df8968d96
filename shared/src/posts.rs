use std::collections::HashMap;

use anyhow::Result;

use crate::{config::SLUG_PLACEHOLDER, PostId};

/// Lookup from a post's public URL path to its destination id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostIndex {
    by_path: HashMap<String, PostId>,
}

impl PostIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from `(post id, slug)` rows of the post catalog.
    ///
    /// Each slug is formatted through `permalink_pattern`, e.g. slug
    /// `hello-world` with `/posts/{slug}/` becomes `/posts/hello-world/`.
    pub fn from_slugs<I, S>(permalink_pattern: &str, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PostId, S)>,
        S: AsRef<str>,
    {
        if !permalink_pattern.contains(SLUG_PLACEHOLDER) {
            anyhow::bail!(
                "permalink pattern `{permalink_pattern}` has no {SLUG_PLACEHOLDER} placeholder"
            );
        }

        let mut index = Self::new();
        for (post_id, slug) in rows {
            let path = permalink_pattern.replace(SLUG_PLACEHOLDER, slug.as_ref());
            index.insert(path, post_id);
        }
        Ok(index)
    }

    /// Later inserts for the same path replace earlier ones.
    pub fn insert(&mut self, path: impl Into<String>, post_id: PostId) {
        self.by_path.insert(path.into(), post_id);
    }

    pub fn get(&self, path: &str) -> Option<PostId> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, PostId)> for PostIndex {
    fn from_iter<T: IntoIterator<Item = (S, PostId)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (path, post_id) in iter {
            index.insert(path, post_id);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::PostIndex;

    #[test]
    fn from_slugs_formats_permalinks() {
        let index = PostIndex::from_slugs("/posts/{slug}/", vec![(10086, "hello-world"), (7, "b")])
            .expect("valid pattern");
        assert_eq!(index.get("/posts/hello-world/"), Some(10086));
        assert_eq!(index.get("/posts/b/"), Some(7));
        assert_eq!(index.get("/posts/missing/"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn duplicate_paths_keep_last_id() {
        let index = PostIndex::from_slugs("/{slug}.html", vec![(1, "a"), (2, "a")])
            .expect("valid pattern");
        assert_eq!(index.get("/a.html"), Some(2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn pattern_without_placeholder_fails() {
        assert!(PostIndex::from_slugs("/posts/", vec![(1, "a")]).is_err());
    }
}
