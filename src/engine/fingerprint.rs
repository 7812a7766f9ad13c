//! Deterministic result fingerprints
//!
//! Identifies "the same" query across re-execution. Cosmetic query formatting
//! (surrounding whitespace, runs of whitespace, letter case) does not change
//! the id.

use sha2::{Digest, Sha256};
use serde_json::Value;

/// Number of hex characters kept from the SHA-256 digest
pub const RESULT_ID_LEN: usize = 16;

/// Trim, collapse whitespace runs to one space, lowercase
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compute the 16-hex-character result id of a (connection, query, params) triple.
///
/// Absent params hash identically to an explicit JSON `null`.
pub fn compute_result_id(connection_id: &str, query: &str, params: Option<&Value>) -> String {
    let params_json = params.unwrap_or(&Value::Null).to_string();

    let mut hasher = Sha256::new();
    hasher.update(connection_id.as_bytes());
    hasher.update(b"\x00");
    hasher.update(normalize_query(query).as_bytes());
    hasher.update(b"\x00");
    hasher.update(params_json.as_bytes());

    let mut id = hex::encode(hasher.finalize());
    id.truncate(RESULT_ID_LEN);
    id
}
