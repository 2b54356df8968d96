use std::path::Path;

use anyhow::{Context, Result};
use comment_sync_shared::{
    posts::PostIndex,
    resolver::{CommentResolver, CommentSink, MigrationReport},
    CommentId, ResolvedComment, SourceComment,
};
use rusqlite::{params, Connection, OptionalExtension};

use crate::schema::TypechoTables;

pub fn connect_db(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path)
        .with_context(|| format!("failed to open SQLite database {}", db_path.display()))
}

pub fn create_tables(conn: &Connection, tables: &TypechoTables) -> Result<()> {
    conn.execute_batch(&tables.create_sql())
        .context("failed to create Typecho tables")
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn ensure_tables_present(conn: &Connection, tables: &TypechoTables) -> Result<()> {
    for name in tables.names() {
        if !table_exists(conn, name)? {
            anyhow::bail!(
                "{name} table not found; point --db-path at an installed Typecho database"
            );
        }
    }
    Ok(())
}

/// Read every post and key it by its public path.
pub fn load_post_index(
    conn: &Connection,
    tables: &TypechoTables,
    permalink_pattern: &str,
) -> Result<PostIndex> {
    let mut stmt = conn
        .prepare(&tables.select_posts_sql())
        .context("failed to prepare post catalog query")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read post catalog")?;

    let index = PostIndex::from_slugs(permalink_pattern, rows)?;
    tracing::info!("Indexed {} posts from {}", index.len(), tables.contents);
    Ok(index)
}

/// Writes resolved comments through one connection (normally an open
/// transaction).
pub struct SqliteCommentSink<'conn> {
    conn: &'conn Connection,
    insert_sql: String,
    refresh_sql: String,
}

impl<'conn> SqliteCommentSink<'conn> {
    pub fn new(conn: &'conn Connection, tables: &TypechoTables) -> Self {
        Self {
            conn,
            insert_sql: tables.insert_comment_sql(),
            refresh_sql: tables.refresh_comment_counts_sql(),
        }
    }
}

impl CommentSink for SqliteCommentSink<'_> {
    fn insert_comment(&mut self, comment: &ResolvedComment) -> Result<CommentId> {
        let mut stmt = self.conn.prepare_cached(&self.insert_sql)?;
        stmt.execute(params![
            comment.post_id,
            comment.created_at,
            comment.author_name,
            comment.author_account_id(),
            comment.owner_account_id,
            comment.author_email,
            comment.author_homepage.as_deref().unwrap_or_default(),
            comment.origin_ip,
            comment.user_agent,
            comment.body_clean,
            comment.kind,
            comment.status,
            comment.parent_id,
        ])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn refresh_comment_counts(&mut self) -> Result<usize> {
        Ok(self.conn.execute(&self.refresh_sql, [])?)
    }
}

/// Run the whole comment pass inside a single transaction.
///
/// Nothing is committed unless every insert and the count refresh succeed;
/// on error the transaction is dropped and rolls back.
pub fn migrate_comments(
    conn: &mut Connection,
    tables: &TypechoTables,
    resolver: &CommentResolver,
    posts: &PostIndex,
    comments: Vec<SourceComment>,
) -> Result<MigrationReport> {
    let tx = conn
        .transaction()
        .context("failed to start migration transaction")?;
    let report = {
        let mut sink = SqliteCommentSink::new(&tx, tables);
        resolver.run(posts, comments, &mut sink)?
    };
    tx.commit().context("failed to commit migrated comments")?;
    Ok(report)
}
