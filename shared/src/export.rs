//! Loader for the comment export (LeanCloud / Valine JSON dump).

use std::{fs, path::Path};

use chrono::NaiveDateTime;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::Value;

use crate::SourceComment;

/// `createdAt` layout in the export; the fraction is optional, `Z` is not.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to read comment export {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("comment export is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("comment export must be a JSON array or an object with a `results` array")]
    UnexpectedShape,
    #[error(
        "malformed comment record #{index} ({})",
        .external_id.as_deref().unwrap_or("no objectId")
    )]
    Record {
        index: usize,
        external_id: Option<String>,
        #[source]
        source: serde_json::Error,
    },
    #[error("comment {external_id} has unparsable createdAt `{value}`")]
    Timestamp {
        external_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComment {
    object_id: String,
    nick: String,
    mail: String,
    #[serde(default)]
    link: Option<String>,
    url: String,
    ua: String,
    created_at: String,
    comment: String,
}

pub fn load_comments(path: &Path) -> Result<Vec<SourceComment>, ExportError> {
    let text = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let comments = parse_comments(&text)?;
    tracing::info!("Loaded {} comments from {}", comments.len(), path.display());
    Ok(comments)
}

/// Parse the whole export, keeping record order. Any bad record fails the
/// entire load.
pub fn parse_comments(text: &str) -> Result<Vec<SourceComment>, ExportError> {
    let root: Value = serde_json::from_str(text)?;
    let records = match root {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove("results") {
            Some(Value::Array(records)) => records,
            _ => return Err(ExportError::UnexpectedShape),
        },
        _ => return Err(ExportError::UnexpectedShape),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record))
        .collect()
}

fn normalize_record(index: usize, record: Value) -> Result<SourceComment, ExportError> {
    let external_id = record
        .get("objectId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let raw: RawComment =
        serde_json::from_value(record).map_err(|source| ExportError::Record {
            index,
            external_id,
            source,
        })?;

    let created_at =
        parse_created_at(&raw.created_at).map_err(|source| ExportError::Timestamp {
            external_id: raw.object_id.clone(),
            value: raw.created_at.clone(),
            source,
        })?;

    Ok(SourceComment {
        post_path: normalize_post_path(&raw.url),
        author_homepage: normalize_optional_text(raw.link),
        external_id: raw.object_id,
        author_nick: raw.nick,
        author_email: raw.mail,
        user_agent: raw.ua,
        created_at,
        body_raw: raw.comment,
    })
}

/// Unix seconds of an export timestamp, read as UTC; sub-second digits are
/// dropped.
pub fn parse_created_at(value: &str) -> Result<i64, chrono::ParseError> {
    let parsed = NaiveDateTime::parse_from_str(value.trim(), CREATED_AT_FORMAT)?;
    Ok(parsed.and_utc().timestamp())
}

/// Absolute URLs are reduced to their path so they can match permalinks;
/// anything else is taken as a path already. Either form is percent-decoded,
/// since permalinks are built from raw slugs.
pub fn normalize_post_path(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => decode_path(parsed.path()),
        _ => decode_path(trimmed),
    }
}

// Paths whose escapes are not UTF-8 are kept encoded.
fn decode_path(path: &str) -> String {
    match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::debug!("keep undecoded post path {path}: {err}");
            path.to_string()
        },
    }
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
