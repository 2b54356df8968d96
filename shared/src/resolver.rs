use anyhow::{Context, Result};

use crate::{
    config::MigrationConfig, identity::IdentityMap, posts::PostIndex, reply::ReplyLinkExtractor,
    sanitize::BodySanitizer, CommentId, ResolvedComment, SourceComment, COMMENT_KIND,
    COMMENT_STATUS_APPROVED,
};

/// Destination of resolved comments.
pub trait CommentSink {
    /// Insert one row and return the id the store assigned to it.
    fn insert_comment(&mut self, comment: &ResolvedComment) -> Result<CommentId>;

    /// Recompute every post's comment count from the stored rows; posts
    /// without comments get 0. Returns the number of posts updated.
    fn refresh_comment_counts(&mut self) -> Result<usize>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub inserted: usize,
    pub skipped_orphans: usize,
    pub replies_linked: usize,
    pub posts_refreshed: usize,
}

pub struct CommentResolver {
    config: MigrationConfig,
    links: ReplyLinkExtractor,
    sanitizer: BodySanitizer,
}

impl CommentResolver {
    pub fn new(config: MigrationConfig) -> Result<Self> {
        Ok(Self {
            config,
            links: ReplyLinkExtractor::new()?,
            sanitizer: BodySanitizer::new()?,
        })
    }

    /// Insert `comments` in order, then refresh per-post comment counts.
    ///
    /// A reply can only point at a comment inserted earlier in the same
    /// call; the identity map is dropped when this returns.
    pub fn run<I, S>(&self, posts: &PostIndex, comments: I, sink: &mut S) -> Result<MigrationReport>
    where
        I: IntoIterator<Item = SourceComment>,
        S: CommentSink + ?Sized,
    {
        let mut identity = IdentityMap::new();
        let mut report = MigrationReport::default();

        for comment in comments {
            let Some(resolved) = self.resolve(posts, &comment, &identity) else {
                tracing::debug!(
                    "Skip comment {}: no post matches {}",
                    comment.external_id,
                    comment.post_path
                );
                report.skipped_orphans += 1;
                continue;
            };

            let destination_id = sink
                .insert_comment(&resolved)
                .with_context(|| format!("failed to insert comment {}", comment.external_id))?;
            identity.record(&comment.external_id, destination_id);

            report.inserted += 1;
            if !resolved.is_top_level() {
                report.replies_linked += 1;
            }
        }

        report.posts_refreshed = sink
            .refresh_comment_counts()
            .context("failed to refresh post comment counts")?;

        tracing::info!(
            "Comment pass done: {} inserted ({} replies), {} skipped without post, {} posts \
             recounted.",
            report.inserted,
            report.replies_linked,
            report.skipped_orphans,
            report.posts_refreshed
        );
        Ok(report)
    }

    /// Shape one source comment into a row, or `None` when its post is
    /// unknown.
    pub fn resolve(
        &self,
        posts: &PostIndex,
        comment: &SourceComment,
        identity: &IdentityMap,
    ) -> Option<ResolvedComment> {
        let post_id = posts.get(&comment.post_path)?;

        Some(ResolvedComment {
            post_id,
            created_at: comment.created_at,
            author_name: comment.author_nick.clone(),
            is_owner: comment.author_nick == self.config.owner_name,
            owner_account_id: self.config.owner_account_id,
            author_email: comment.author_email.clone(),
            author_homepage: comment.author_homepage.clone(),
            origin_ip: self.config.origin_ip.clone(),
            user_agent: comment.user_agent.clone(),
            body_clean: self.sanitizer.clean(&comment.body_raw),
            kind: COMMENT_KIND.to_string(),
            status: COMMENT_STATUS_APPROVED.to_string(),
            parent_id: self.links.resolve_parent(&comment.body_raw, identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::Result;

    use super::{CommentResolver, CommentSink};
    use crate::{
        config::MigrationConfig, posts::PostIndex, CommentId, PostId, ResolvedComment,
        SourceComment,
    };

    #[derive(Default)]
    struct MemorySink {
        next_id: CommentId,
        rows: Vec<(CommentId, ResolvedComment)>,
        counts: HashMap<PostId, usize>,
        fail_on_insert: Option<usize>,
    }

    impl MemorySink {
        fn starting_at(next_id: CommentId) -> Self {
            Self {
                next_id,
                ..Self::default()
            }
        }
    }

    impl CommentSink for MemorySink {
        fn insert_comment(&mut self, comment: &ResolvedComment) -> Result<CommentId> {
            if self.fail_on_insert == Some(self.rows.len()) {
                anyhow::bail!("disk full");
            }
            let id = self.next_id;
            self.next_id += 1;
            self.rows.push((id, comment.clone()));
            Ok(id)
        }

        fn refresh_comment_counts(&mut self) -> Result<usize> {
            self.counts.clear();
            for (_, row) in &self.rows {
                *self.counts.entry(row.post_id).or_default() += 1;
            }
            Ok(self.counts.len())
        }
    }

    fn comment(external_id: &str, post_path: &str, body: &str) -> SourceComment {
        SourceComment {
            external_id: external_id.to_string(),
            author_nick: "Guest".to_string(),
            author_email: "guest@example.com".to_string(),
            post_path: post_path.to_string(),
            author_homepage: None,
            user_agent: "test-agent".to_string(),
            created_at: 1_600_000_000,
            body_raw: body.to_string(),
        }
    }

    fn posts() -> PostIndex {
        [("/posts/a/", 10), ("/posts/b/", 20)].into_iter().collect()
    }

    fn resolver(owner: &str) -> CommentResolver {
        CommentResolver::new(MigrationConfig {
            owner_name: owner.to_string(),
            ..MigrationConfig::default()
        })
        .expect("resolver builds")
    }

    #[test]
    fn top_level_comment_is_inserted_as_is() -> Result<()> {
        let mut sink = MemorySink::starting_at(1);
        let comments = vec![comment("c1", "/posts/a/", "hello")];
        let report = resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert_eq!(report.inserted, 1);
        let (_, row) = &sink.rows[0];
        assert_eq!(row.post_id, 10);
        assert_eq!(row.parent_id, 0);
        assert_eq!(row.body_clean, "hello");
        assert_eq!(row.kind, "comment");
        assert_eq!(row.status, "approved");
        assert_eq!(row.origin_ip, "127.0.0.1");
        assert_eq!(row.owner_account_id, 1);
        Ok(())
    }

    #[test]
    fn reply_links_to_earlier_destination_id() -> Result<()> {
        let mut sink = MemorySink::starting_at(501);
        let comments = vec![
            comment("x1", "/posts/a/", "parent"),
            comment("x2", "/posts/a/", r##"<a class="at" href="#x1">@Guest </a> , child"##),
        ];
        let report = resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert_eq!(sink.rows[0].0, 501);
        assert_eq!(sink.rows[1].1.parent_id, 501);
        assert_eq!(sink.rows[1].1.body_clean, "child");
        assert_eq!(report.replies_linked, 1);
        Ok(())
    }

    #[test]
    fn forward_and_self_references_stay_top_level() -> Result<()> {
        let mut sink = MemorySink::starting_at(1);
        let comments = vec![
            comment("early", "/posts/a/", r##"<a href="#late">@late</a>"##),
            comment("self", "/posts/a/", r##"<a href="#self">@me</a>"##),
            comment("late", "/posts/a/", "I come last"),
        ];
        resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert!(sink.rows.iter().all(|(_, row)| row.parent_id == 0));
        Ok(())
    }

    #[test]
    fn orphan_comment_is_skipped_and_never_becomes_parent() -> Result<()> {
        let mut sink = MemorySink::starting_at(1);
        let comments = vec![
            comment("orphan", "/posts/gone/", "nobody home"),
            comment("next", "/posts/b/", r##"<a href="#orphan">@x</a>reply"##),
        ];
        let report = resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert_eq!(report.skipped_orphans, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(sink.rows.len(), 1);
        assert_eq!(sink.rows[0].1.post_id, 20);
        assert_eq!(sink.rows[0].1.parent_id, 0);
        Ok(())
    }

    #[test]
    fn owner_match_is_exact_and_case_sensitive() -> Result<()> {
        let mut sink = MemorySink::starting_at(1);
        let nicks = ["Bear", "bear", "Bear ", "Polar Bear"];
        let comments = nicks.iter().enumerate().map(|(index, nick)| SourceComment {
            author_nick: nick.to_string(),
            ..comment(&format!("c{index}"), "/posts/a/", "hi")
        });
        resolver("Bear").run(&posts(), comments, &mut sink)?;

        let flags: Vec<bool> = sink.rows.iter().map(|(_, row)| row.is_owner).collect();
        assert_eq!(flags, vec![true, false, false, false]);
        assert_eq!(sink.rows[0].1.author_account_id(), 1);
        assert_eq!(sink.rows[1].1.author_account_id(), 0);
        Ok(())
    }

    #[test]
    fn duplicate_external_id_points_at_latest_insert() -> Result<()> {
        let mut sink = MemorySink::starting_at(100);
        let comments = vec![
            comment("dup", "/posts/a/", "first copy"),
            comment("dup", "/posts/a/", "second copy"),
            comment("reply", "/posts/a/", r##"<a href="#dup">@dup</a>"##),
        ];
        resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert_eq!(sink.rows.len(), 3);
        assert_eq!(sink.rows[2].1.parent_id, 101);
        Ok(())
    }

    #[test]
    fn counts_are_refreshed_after_the_pass() -> Result<()> {
        let mut sink = MemorySink::starting_at(1);
        let comments = vec![
            comment("a1", "/posts/a/", "one"),
            comment("a2", "/posts/a/", "two"),
        ];
        let report = resolver("Bear").run(&posts(), comments, &mut sink)?;

        assert_eq!(sink.counts.get(&10), Some(&2));
        assert_eq!(report.posts_refreshed, 1);
        Ok(())
    }

    #[test]
    fn insert_failure_aborts_the_pass() {
        let mut sink = MemorySink {
            fail_on_insert: Some(1),
            ..MemorySink::starting_at(1)
        };
        let comments = vec![
            comment("a1", "/posts/a/", "one"),
            comment("a2", "/posts/a/", "two"),
            comment("a3", "/posts/a/", "three"),
        ];
        let err = resolver("Bear")
            .run(&posts(), comments, &mut sink)
            .expect_err("second insert fails");

        assert!(format!("{err:#}").contains("a2"));
        assert_eq!(sink.rows.len(), 1);
        assert!(sink.counts.is_empty());
    }
}
