//! Resolve which parameters a query references and whether they are ready
//!
//! Pure and stateless: called afresh with the current parameter snapshot
//! before every potential execution. Keeping derived companions (for example
//! the `_from`/`_to` of a `date-relative` preset) fresh is the caller's job.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

/// `$param_<name>` placeholder, case-sensitive, ASCII word characters
pub static PARAM_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$param_([A-Za-z0-9_]+)").expect("valid placeholder regex"));

/// Bare parameter names referenced by `query`, de-duplicated, in first-occurrence order
pub fn referenced_param_names(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PARAM_PLACEHOLDER
        .captures_iter(query)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Copy the referenced parameters present in `all_params`, keyed `param_<name>`.
///
/// Values are copied verbatim; referenced names absent from `all_params` are omitted.
pub fn extract_referenced_params(query: &str, all_params: &Map<String, Value>) -> Map<String, Value> {
    referenced_param_names(query)
        .into_iter()
        .filter_map(|name| {
            all_params
                .get(&name)
                .map(|value| (format!("param_{}", name), value.clone()))
        })
        .collect()
}

/// A value counts as missing when it is null, an empty string or an empty array
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Referenced names whose value is missing, in first-occurrence order
pub fn get_missing_param_names(query: &str, all_params: &Map<String, Value>) -> Vec<String> {
    referenced_param_names(query)
        .into_iter()
        .filter(|name| is_missing(all_params.get(name)))
        .collect()
}

/// True when every referenced parameter has a value (vacuously true without placeholders)
pub fn all_referenced_params_ready(query: &str, all_params: &Map<String, Value>) -> bool {
    get_missing_param_names(query, all_params).is_empty()
}
