use anyhow::Result;
use comment_sync_shared::config::validate_table_prefix;

/// `contents.type` of the rows that can receive comments.
pub const POST_TYPE: &str = "post";

/// Names of the Typecho tables touched by a migration, prefix applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypechoTables {
    pub contents: String,
    pub comments: String,
}

impl TypechoTables {
    pub fn new(prefix: &str) -> Result<Self> {
        validate_table_prefix(prefix)?;
        Ok(Self {
            contents: format!("{prefix}contents"),
            comments: format!("{prefix}comments"),
        })
    }

    pub fn names(&self) -> [&str; 2] {
        [&self.contents, &self.comments]
    }

    /// Subset of the Typecho SQLite layout the migration reads and writes.
    pub fn create_sql(&self) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {contents} (
                "cid" INTEGER NOT NULL PRIMARY KEY,
                "title" VARCHAR(150) DEFAULT NULL,
                "slug" VARCHAR(150) DEFAULT NULL UNIQUE,
                "created" INT(10) DEFAULT 0,
                "type" VARCHAR(16) DEFAULT 'post',
                "status" VARCHAR(16) DEFAULT 'publish',
                "commentsNum" INT(10) DEFAULT 0,
                "allowComment" CHAR(1) DEFAULT '0'
            );
            CREATE TABLE IF NOT EXISTS {comments} (
                "coid" INTEGER NOT NULL PRIMARY KEY,
                "cid" INT(10) DEFAULT 0,
                "created" INT(10) DEFAULT 0,
                "author" VARCHAR(150) DEFAULT NULL,
                "authorId" INT(10) DEFAULT 0,
                "ownerId" INT(10) DEFAULT 0,
                "mail" VARCHAR(150) DEFAULT NULL,
                "url" VARCHAR(255) DEFAULT NULL,
                "ip" VARCHAR(64) DEFAULT NULL,
                "agent" VARCHAR(511) DEFAULT NULL,
                "text" TEXT,
                "type" VARCHAR(16) DEFAULT 'comment',
                "status" VARCHAR(16) DEFAULT 'approved',
                "parent" INT(10) DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS {comments}_cid ON {comments} ("cid");
            "#,
            contents = self.contents,
            comments = self.comments,
        )
    }

    pub fn select_posts_sql(&self) -> String {
        format!(
            "SELECT cid, slug FROM {} WHERE type = '{POST_TYPE}' AND slug IS NOT NULL",
            self.contents
        )
    }

    // Column order matches `ResolvedComment`.
    pub fn insert_comment_sql(&self) -> String {
        format!(
            "INSERT INTO {} (cid, created, author, authorId, ownerId, mail, url, ip, agent, \
             text, type, status, parent) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
             ?12, ?13)",
            self.comments
        )
    }

    /// Correlated count, so rows without comments end up with 0.
    pub fn refresh_comment_counts_sql(&self) -> String {
        format!(
            "UPDATE {contents} SET commentsNum = (SELECT COUNT(1) FROM {comments} WHERE \
             {comments}.cid = {contents}.cid)",
            contents = self.contents,
            comments = self.comments,
        )
    }
}
