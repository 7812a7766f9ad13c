//! Row-limited previews for the query editor

use super::models::DbType;
use regex::Regex;
use std::sync::LazyLock;

/// Rows returned by an editor preview
pub const PREVIEW_ROW_LIMIT: usize = 25;

static TRAILING_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| {
        Regex::new(r"(?i)\bLIMIT\s+(\d+|\$[A-Za-z_][A-Za-z0-9_]*)\s*$").expect("valid limit regex")
    });

/// Append `LIMIT 25` unless the query already ends with a `LIMIT n` or
/// `LIMIT $param` clause.
///
/// Both Cypher and SQL accept a trailing `LIMIT`, so the rule is shared by the
/// two dialects. A trailing `;` is dropped before checking.
pub fn wrap_with_preview_limit(query: &str, db_type: DbType) -> String {
    let trimmed = query.trim().trim_end_matches(';').trim_end();

    if TRAILING_LIMIT.is_match(trimmed) {
        return trimmed.to_string();
    }

    match db_type {
        DbType::Neo4j | DbType::Postgresql => format!("{} LIMIT {}", trimmed, PREVIEW_ROW_LIMIT),
    }
}
