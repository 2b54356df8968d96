use std::path::Path;

use anyhow::{Context, Result};
use comment_sync_shared::{
    config::MigrationConfig,
    export::load_comments,
    resolver::{CommentResolver, MigrationReport},
};

use crate::{
    db::{connect_db, ensure_tables_present, load_post_index, migrate_comments},
    schema::TypechoTables,
};

pub fn run(db_path: &Path, export_file: &Path, config: MigrationConfig) -> Result<MigrationReport> {
    config.validate()?;
    let tables = TypechoTables::new(&config.table_prefix)?;

    let mut conn = connect_db(db_path)?;
    ensure_tables_present(&conn, &tables)?;

    let posts = load_post_index(&conn, &tables, &config.permalink_pattern)?;
    let comments = load_comments(export_file).context("failed to load comment export")?;
    if posts.is_empty() {
        tracing::warn!("No posts found in {}; every comment will be skipped", tables.contents);
    }

    let resolver = CommentResolver::new(config)?;
    let report = migrate_comments(&mut conn, &tables, &resolver, &posts, comments)?;

    tracing::info!(
        "Migrated {} comments into {} ({} skipped).",
        report.inserted,
        db_path.display(),
        report.skipped_orphans
    );
    Ok(report)
}
