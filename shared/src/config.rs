use std::env;

use anyhow::Result;

pub const DEFAULT_OWNER_NAME: &str = "admin";
pub const DEFAULT_OWNER_ACCOUNT_ID: i64 = 1;
pub const DEFAULT_ORIGIN_IP: &str = "127.0.0.1";
pub const DEFAULT_PERMALINK_PATTERN: &str = "/posts/{slug}/";
pub const DEFAULT_TABLE_PREFIX: &str = "typecho_";

/// Placeholder substituted with the post slug in a permalink pattern.
pub const SLUG_PLACEHOLDER: &str = "{slug}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Display name that marks a comment as written by the blog owner.
    pub owner_name: String,
    /// Blog account every imported comment is attributed to.
    pub owner_account_id: i64,
    /// Stored as the comment IP; the export carries none.
    pub origin_ip: String,
    pub permalink_pattern: String,
    pub table_prefix: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            owner_name: DEFAULT_OWNER_NAME.to_string(),
            owner_account_id: DEFAULT_OWNER_ACCOUNT_ID,
            origin_ip: DEFAULT_ORIGIN_IP.to_string(),
            permalink_pattern: DEFAULT_PERMALINK_PATTERN.to_string(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl MigrationConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from `COMMENT_SYNC_*` values supplied by `lookup`.
    /// Missing, unparsable or placeholder-less values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let owner_name = lookup("COMMENT_SYNC_OWNER_NAME").unwrap_or(defaults.owner_name);
        let owner_account_id = lookup("COMMENT_SYNC_OWNER_ACCOUNT_ID")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(defaults.owner_account_id);
        let origin_ip = lookup("COMMENT_SYNC_ORIGIN_IP")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.origin_ip);
        let permalink_pattern = lookup("COMMENT_SYNC_PERMALINK_PATTERN")
            .filter(|value| value.contains(SLUG_PLACEHOLDER))
            .unwrap_or(defaults.permalink_pattern);
        let table_prefix = lookup("COMMENT_SYNC_TABLE_PREFIX").unwrap_or(defaults.table_prefix);

        Self {
            owner_name,
            owner_account_id,
            origin_ip,
            permalink_pattern,
            table_prefix,
        }
    }

    /// Check the parts of the config that end up inside SQL or key lookups.
    pub fn validate(&self) -> Result<()> {
        validate_table_prefix(&self.table_prefix)?;
        if !self.permalink_pattern.contains(SLUG_PLACEHOLDER) {
            anyhow::bail!(
                "permalink pattern `{}` has no {SLUG_PLACEHOLDER} placeholder",
                self.permalink_pattern
            );
        }
        Ok(())
    }
}

/// Table prefixes are spliced into SQL text, so only `[A-Za-z0-9_]` passes.
pub fn validate_table_prefix(prefix: &str) -> Result<()> {
    if let Some(bad) = prefix
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_'))
    {
        anyhow::bail!("invalid character {bad:?} in table prefix `{prefix}`");
    }
    Ok(())
}
