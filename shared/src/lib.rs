//! Core of the comment export migration: post lookup, export loading, reply
//! resolution, body sanitizing and the single-pass insert driver.

pub mod config;
pub mod export;
pub mod identity;
pub mod posts;
pub mod reply;
pub mod resolver;
pub mod sanitize;

/// Destination post identifier (`contents.cid`).
pub type PostId = i64;
/// Destination comment identifier (`comments.coid`).
pub type CommentId = i64;

/// `comments.type` value for every imported row.
pub const COMMENT_KIND: &str = "comment";
/// `comments.status` value for every imported row.
pub const COMMENT_STATUS_APPROVED: &str = "approved";
/// `parent` value of a top-level comment.
pub const TOP_LEVEL_PARENT: CommentId = 0;

// One record of the export, after normalization by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceComment {
    pub external_id: String,
    pub author_nick: String,
    pub author_email: String,
    pub post_path: String,
    pub author_homepage: Option<String>,
    pub user_agent: String,
    pub created_at: i64, // Unix seconds
    pub body_raw: String,
}

// Row handed to the persistence layer, fields in insert order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComment {
    pub post_id: PostId,
    pub created_at: i64,
    pub author_name: String,
    pub is_owner: bool,
    pub owner_account_id: i64,
    pub author_email: String,
    pub author_homepage: Option<String>,
    pub origin_ip: String,
    pub user_agent: String,
    pub body_clean: String,
    pub kind: String,
    pub status: String,
    pub parent_id: CommentId,
}

impl ResolvedComment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id == TOP_LEVEL_PARENT
    }

    /// Value stored in `comments.authorId`: the blog account for the owner, 0
    /// for guests.
    pub fn author_account_id(&self) -> i64 {
        if self.is_owner {
            self.owner_account_id
        } else {
            0
        }
    }
}
