use std::path::PathBuf;

use clap::Parser;
use comment_sync_shared::config::MigrationConfig;

/// Every flag is optional; unset ones fall back to `COMMENT_SYNC_*` env vars
/// and then to built-in defaults.
#[derive(Parser, Debug)]
#[command(
    name = "cs-cli",
    version,
    about = "Load an exported comment dump into a Typecho SQLite database"
)]
pub struct Cli {
    /// SQLite database holding the Typecho tables.
    #[arg(long, default_value = "./data/typecho.db")]
    pub db_path: PathBuf,
    /// Comment export file (JSON array of records).
    #[arg(long, default_value = "./comments.json")]
    pub export_file: PathBuf,
    /// Display name of the blog owner; matching comments are attributed to
    /// the owner account.
    #[arg(long)]
    pub owner_name: Option<String>,
    /// Blog account id imported comments belong to.
    #[arg(long)]
    pub owner_account_id: Option<i64>,
    /// Typecho table prefix.
    #[arg(long)]
    pub table_prefix: Option<String>,
    /// Post permalink layout, `{slug}` is replaced by the post slug.
    #[arg(long)]
    pub permalink_pattern: Option<String>,
}

impl Cli {
    pub fn migration_config(&self) -> MigrationConfig {
        self.overlay(MigrationConfig::from_env())
    }

    /// Replace the fields of `config` that were given on the command line.
    pub fn overlay(&self, mut config: MigrationConfig) -> MigrationConfig {
        if let Some(owner_name) = &self.owner_name {
            config.owner_name = owner_name.clone();
        }
        if let Some(owner_account_id) = self.owner_account_id {
            config.owner_account_id = owner_account_id;
        }
        if let Some(table_prefix) = &self.table_prefix {
            config.table_prefix = table_prefix.clone();
        }
        if let Some(permalink_pattern) = &self.permalink_pattern {
            config.permalink_pattern = permalink_pattern.clone();
        }
        config
    }
}
