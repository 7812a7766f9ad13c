//! PostgreSQL adapter (sqlx pool)
//!
//! Widget queries use `$param_name` placeholders; PostgreSQL only understands
//! positional `$n`, so placeholders are rewritten before execution. Values are
//! sent as text and cast server-side to the type PostgreSQL infers for each
//! placeholder, so a date string compares against a `date` column and an
//! absent parameter is a NULL of the column's type.

use super::models::{ColumnSchema, ConnectionCredentials, DatabaseSchema, QueryResult, TableSchema};
use super::traits::{QueryAdapter, QueryExecutionError};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgValueFormat, PgValueRef};
use sqlx::{Column, Executor, Postgres, Row, Statement, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

static PLACEHOLDER_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$param_([A-Za-z0-9_]+)").expect("valid placeholder regex"));

static DOLLAR_QUOTE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$").expect("valid dollar-quote regex"));

/// Type names that can follow `::` unquoted
static CASTABLE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\[\])?$").expect("valid type-name regex"));

/// Adapter holding a lazily-connecting sqlx pool
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Build a pool; no connection is opened until the first query
    pub fn connect(credentials: &ConnectionCredentials) -> Result<Self, QueryExecutionError> {
        let mut options = PgConnectOptions::from_str(&credentials.uri)?
            .username(&credentials.username)
            .password(&credentials.password);
        if let Some(ref database) = credentials.database {
            options = options.database(database);
        }

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options);

        tracing::debug!("PostgreSQL pool created");
        Ok(Self { pool })
    }

    /// Types PostgreSQL infers for `$1..$n` when `sql` is prepared untyped
    async fn infer_param_types(&self, sql: &str) -> Result<Vec<String>, QueryExecutionError> {
        let statement = self.pool.prepare(sql).await?;
        Ok(statement
            .parameters()
            .and_then(|params| params.left())
            .map(|types| types.iter().map(|t| t.name().to_string()).collect())
            .unwrap_or_default())
    }
}

/// Byte ranges and names of `$param_` placeholders outside string literals,
/// quoted identifiers, comments and dollar-quoted bodies
fn placeholder_spans(sql: &str) -> Vec<(usize, usize, String)> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                let backslash_escapes = i > 0
                    && matches!(bytes[i - 1], b'E' | b'e')
                    && (i < 2 || !(bytes[i - 2].is_ascii_alphanumeric() || bytes[i - 2] == b'_'));
                i += 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' if backslash_escapes => i += 2,
                        b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                        b'\'' => break,
                        _ => i += 1,
                    }
                }
                i += 1;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'"' {
                        if bytes.get(i + 1) == Some(&b'"') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut depth = 0usize;
                while i < bytes.len() {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        depth += 1;
                        i += 2;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        depth -= 1;
                        i += 2;
                        if depth == 0 {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'$' => {
                let rest = &sql[i..];
                if let Some(tag) = DOLLAR_QUOTE_TAG.find(rest) {
                    let tag = tag.as_str();
                    let body_start = i + tag.len();
                    i = match sql[body_start..].find(tag) {
                        Some(offset) => body_start + offset + tag.len(),
                        None => bytes.len(),
                    };
                } else if let Some(caps) = PLACEHOLDER_AT.captures(rest) {
                    let len = caps[0].len();
                    spans.push((i, i + len, caps[1].to_string()));
                    i += len;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    spans
}

/// Replace each placeholder with `render(index)`, where a repeated name
/// reuses its 1-based index. Returns the SQL and the names in index order.
fn replace_placeholders(sql: &str, mut render: impl FnMut(usize) -> String) -> (String, Vec<String>) {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for (start, end, name) in placeholder_spans(sql) {
        let index = *positions.entry(name.clone()).or_insert_with(|| {
            names.push(name);
            names.len()
        });
        out.push_str(&sql[last..start]);
        out.push_str(&render(index));
        last = end;
    }
    out.push_str(&sql[last..]);
    (out, names)
}

/// Rewrite `$param_name` placeholders to `$1..$n`.
///
/// A repeated name reuses its index. Returns the rewritten SQL and the values
/// in positional order; placeholders with no `param_` key bind as NULL.
pub(crate) fn rewrite_placeholders(sql: &str, params: &Map<String, Value>) -> (String, Vec<Value>) {
    let (rewritten, names) = replace_placeholders(sql, |index| format!("${}", index));
    let values = names
        .iter()
        .map(|name| {
            params
                .get(&format!("param_{}", name))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();
    (rewritten, values)
}

/// Rewrite placeholders to `$n::text::<type>` using the inferred types
pub(crate) fn rewrite_with_casts(sql: &str, types: &[String]) -> String {
    replace_placeholders(sql, |index| {
        match types.get(index - 1).map(String::as_str).filter(|t| is_castable(t)) {
            Some(type_name) if !type_name.eq_ignore_ascii_case("TEXT") => {
                format!("${}::text::{}", index, type_name)
            }
            _ => format!("${}::text", index),
        }
    })
    .0
}

fn is_castable(type_name: &str) -> bool {
    CASTABLE_TYPE.is_match(type_name)
        && !matches!(
            type_name.to_ascii_uppercase().as_str(),
            "UNKNOWN" | "RECORD" | "VOID" | "ANY" | "ANYELEMENT" | "ANYARRAY"
        )
}

/// Text form of a JSON value for a placeholder of `type_name`; JSON null is SQL NULL
pub(crate) fn value_as_text(value: &Value, type_name: Option<&str>) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if type_name.is_some_and(|t| t.ends_with("[]")) => {
            Some(array_literal(items))
        }
        other => Some(other.to_string()),
    }
}

/// PostgreSQL array literal, e.g. `{"FR","DE"}`
fn array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::Array(inner) => array_literal(inner),
            Value::String(s) => quote_array_element(s),
            Value::Bool(_) | Value::Number(_) => item.to_string(),
            Value::Object(_) => quote_array_element(&item.to_string()),
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

fn quote_array_element(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Decode one row into a JSON object keyed by column name
fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut record = Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = decode_column(row, idx, column.type_info().name());
        record.insert(column.name().to_string(), value);
    }
    record
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    let value = match type_name {
        "BOOL" => get::<bool>(row, idx).map(Value::from),
        "INT2" => get::<i16>(row, idx).map(Value::from),
        "INT4" => get::<i32>(row, idx).map(Value::from),
        "INT8" => get::<i64>(row, idx).map(Value::from),
        "FLOAT4" => get::<f32>(row, idx).map(Value::from),
        "FLOAT8" => get::<f64>(row, idx).map(Value::from),
        "NUMERIC" => row.try_get_raw(idx).ok().and_then(decode_numeric),
        "JSON" | "JSONB" => get::<Value>(row, idx),
        "UUID" => get::<uuid::Uuid>(row, idx).map(|u| Value::from(u.to_string())),
        "DATE" => get::<chrono::NaiveDate>(row, idx).map(|d| Value::from(d.to_string())),
        "TIMESTAMP" => get::<chrono::NaiveDateTime>(row, idx)
            .map(|d| Value::from(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => {
            get::<chrono::DateTime<chrono::Utc>>(row, idx).map(|d| Value::from(d.to_rfc3339()))
        }
        "TEXT[]" | "VARCHAR[]" | "NAME[]" => get::<Vec<String>>(row, idx).map(Value::from),
        "INT4[]" => get::<Vec<i32>>(row, idx).map(Value::from),
        "INT8[]" => get::<Vec<i64>>(row, idx).map(Value::from),
        "FLOAT8[]" => get::<Vec<f64>>(row, idx).map(Value::from),
        "BOOL[]" => get::<Vec<bool>>(row, idx).map(Value::from),
        _ => get::<String>(row, idx).map(Value::from),
    };
    value.unwrap_or(Value::Null)
}

/// Decode a NUMERIC without pulling in a decimal crate
fn decode_numeric(raw: PgValueRef<'_>) -> Option<Value> {
    if raw.is_null() {
        return None;
    }
    let text = match raw.format() {
        PgValueFormat::Text => raw.as_str().ok()?.to_string(),
        PgValueFormat::Binary => numeric_binary_to_string(raw.as_bytes().ok()?)?,
    };
    numeric_text_to_json(&text)
}

fn numeric_text_to_json(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Value::from(f)),
        _ => Some(Value::from(text)),
    }
}

/// Binary NUMERIC: ndigits, weight, sign, dscale (i16/u16 each) then base-10000 digits
fn numeric_binary_to_string(bytes: &[u8]) -> Option<String> {
    let read = |i: usize| -> Option<i16> {
        bytes
            .get(i * 2..i * 2 + 2)
            .map(|b| i16::from_be_bytes([b[0], b[1]]))
    };

    let ndigits = read(0)? as i32;
    let weight = read(1)? as i32;
    let sign = read(2)? as u16;
    let dscale = read(3)? as i32;
    if sign == 0xC000 {
        return Some("NaN".to_string());
    }

    let digit = |i: i32| -> i16 {
        if i >= 0 && i < ndigits {
            read(4 + i as usize).unwrap_or(0)
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                out.push_str(&digit(i).to_string());
            } else {
                out.push_str(&format!("{:04}", digit(i)));
            }
        }
    }

    if dscale > 0 {
        let mut frac = String::new();
        let groups = (dscale + 3) / 4;
        for k in 1..=groups {
            frac.push_str(&format!("{:04}", digit(weight + k)));
        }
        frac.truncate(dscale as usize);
        out.push('.');
        out.push_str(&frac);
    }

    Some(out)
}

#[async_trait]
impl QueryAdapter for PostgresAdapter {
    async fn run_query(
        &self,
        sql: &str,
        params: &Map<String, Value>,
    ) -> Result<QueryResult, QueryExecutionError> {
        let (rewritten, values) = rewrite_placeholders(sql, params);

        let rows = if values.is_empty() {
            sqlx::query(&rewritten).fetch_all(&self.pool).await?
        } else {
            let types = self.infer_param_types(&rewritten).await?;
            let typed = rewrite_with_casts(sql, &types);
            values
                .iter()
                .enumerate()
                .fold(sqlx::query(&typed), |q, (i, value)| {
                    q.bind(value_as_text(value, types.get(i).map(String::as_str)))
                })
                .fetch_all(&self.pool)
                .await?
        };

        let data = rows.iter().map(row_to_json).collect();
        Ok(QueryResult::from_rows(data))
    }

    async fn test_connection(&self) -> Result<(), QueryExecutionError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_schema(&self) -> Result<DatabaseSchema, QueryExecutionError> {
        let rows = sqlx::query(
            "SELECT table_schema, table_name, column_name, data_type \
             FROM information_schema.columns \
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_schema, table_name, ordinal_position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables: Vec<TableSchema> = Vec::new();
        for row in rows {
            let schema: String = row.try_get("table_schema")?;
            let name: String = row.try_get("table_name")?;
            let column = ColumnSchema {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
            };

            match tables.last_mut() {
                Some(t) if t.schema == schema && t.name == name => t.columns.push(column),
                _ => tables.push(TableSchema {
                    schema,
                    name,
                    columns: vec![column],
                }),
            }
        }

        Ok(DatabaseSchema::Relational { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_rewrite_placeholders_positional() {
        let (sql, values) = rewrite_placeholders(
            "SELECT * FROM t WHERE a = $param_a AND b = $param_b",
            &params(json!({"param_a": 1, "param_b": "x"})),
        );
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(values, vec![json!(1), json!("x")]);
    }

    #[test]
    fn test_rewrite_reuses_index_for_repeats() {
        let (sql, values) = rewrite_placeholders(
            "SELECT $param_x, $param_y, $param_x",
            &params(json!({"param_x": true, "param_y": [1, 2]})),
        );
        assert_eq!(sql, "SELECT $1, $2, $1");
        assert_eq!(values, vec![json!(true), json!([1, 2])]);
    }

    #[test]
    fn test_rewrite_missing_param_binds_null() {
        let (sql, values) = rewrite_placeholders("SELECT $param_gone", &Map::new());
        assert_eq!(sql, "SELECT $1");
        assert_eq!(values, vec![Value::Null]);
    }

    #[test]
    fn test_rewrite_leaves_plain_positional_untouched() {
        let (sql, values) = rewrite_placeholders("SELECT $1", &Map::new());
        assert_eq!(sql, "SELECT $1");
        assert!(values.is_empty());
    }

    #[test]
    fn test_rewrite_skips_literals_and_comments() {
        let sql = "SELECT '$param_a', \"$param_b\", E'it\\'s $param_c', $$ $param_d $$ \
                   -- $param_e\n/* $param_f /* nested */ */ FROM t WHERE x = $param_g";
        let (rewritten, values) = rewrite_placeholders(sql, &params(json!({"param_g": 1})));
        assert!(rewritten.contains("'$param_a'"));
        assert!(rewritten.contains("\"$param_b\""));
        assert!(rewritten.contains("$param_c"));
        assert!(rewritten.contains("$$ $param_d $$"));
        assert!(rewritten.contains("-- $param_e"));
        assert!(rewritten.contains("/* $param_f /* nested */ */"));
        assert!(rewritten.ends_with("WHERE x = $1"));
        assert_eq!(values, vec![json!(1)]);
    }

    #[test]
    fn test_rewrite_with_escaped_quote_in_literal() {
        let (sql, values) = rewrite_placeholders(
            "SELECT 'it''s' AS a, $param_x AS b",
            &params(json!({"param_x": "v"})),
        );
        assert_eq!(sql, "SELECT 'it''s' AS a, $1 AS b");
        assert_eq!(values, vec![json!("v")]);
    }

    #[test]
    fn test_casts_follow_inferred_types() {
        let types = vec!["DATE".to_string(), "INT4".to_string(), "TEXT".to_string()];
        let sql = rewrite_with_casts(
            "SELECT * FROM t WHERE d >= $param_from AND d <= $param_to AND n = $param_gone",
            &types,
        );
        assert_eq!(
            sql,
            "SELECT * FROM t WHERE d >= $1::text::DATE AND d <= $2::text::INT4 AND n = $3::text"
        );

        let sql = rewrite_with_casts("SELECT $param_a, $param_b, $param_a", &["TEXT[]".to_string(), "UNKNOWN".to_string()]);
        assert_eq!(sql, "SELECT $1::text::TEXT[], $2::text, $1::text::TEXT[]");
    }

    #[test]
    fn test_casts_without_inferred_types_fall_back_to_text() {
        assert_eq!(rewrite_with_casts("SELECT $param_a", &[]), "SELECT $1::text");
        assert_eq!(
            rewrite_with_casts("SELECT $param_a", &["public.\"Mood\"".to_string()]),
            "SELECT $1::text"
        );
    }

    #[test]
    fn test_date_companions_bind_as_text_for_date_columns() {
        let query = "SELECT d FROM t WHERE d >= $param_period_from AND d <= $param_period_to";
        let bound = crate::params::extract_referenced_params(
            query,
            &params(json!({"period_from": "2025-06-09", "period_to": "2025-06-15"})),
        );
        let (_, values) = rewrite_placeholders(query, &bound);
        let types = vec!["DATE".to_string(), "DATE".to_string()];

        let texts: Vec<_> = values
            .iter()
            .zip(&types)
            .map(|(v, t)| value_as_text(v, Some(t.as_str())))
            .collect();
        assert_eq!(texts, vec![Some("2025-06-09".to_string()), Some("2025-06-15".to_string())]);
        assert_eq!(
            rewrite_with_casts(query, &types),
            "SELECT d FROM t WHERE d >= $1::text::DATE AND d <= $2::text::DATE"
        );
    }

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&Value::Null, Some("INT4")), None);
        assert_eq!(value_as_text(&json!(true), Some("BOOL")).as_deref(), Some("true"));
        assert_eq!(value_as_text(&json!(1.5), Some("NUMERIC")).as_deref(), Some("1.5"));
        assert_eq!(
            value_as_text(&json!(["FR", "a\"b", null]), Some("TEXT[]")).as_deref(),
            Some(r#"{"FR","a\"b",NULL}"#)
        );
        assert_eq!(value_as_text(&json!([1, [2, 3]]), Some("INT8[]")).as_deref(), Some("{1,{2,3}}"));
        assert_eq!(
            value_as_text(&json!({"from": 1}), Some("JSONB")).as_deref(),
            Some(r#"{"from":1}"#)
        );
        assert_eq!(value_as_text(&json!([1, 2]), Some("JSONB")).as_deref(), Some("[1,2]"));
    }

    fn numeric_bytes(ndigits: i16, weight: i16, sign: u16, dscale: i16, digits: &[i16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&ndigits.to_be_bytes());
        out.extend_from_slice(&weight.to_be_bytes());
        out.extend_from_slice(&sign.to_be_bytes());
        out.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_numeric_binary_decoding() {
        // 12345.67 = [1, 2345, 6700], weight 1, dscale 2
        let bytes = numeric_bytes(3, 1, 0, 2, &[1, 2345, 6700]);
        assert_eq!(numeric_binary_to_string(&bytes).unwrap(), "12345.67");

        // -0.005 = [50], weight -1, dscale 3
        let bytes = numeric_bytes(1, -1, 0x4000, 3, &[50]);
        assert_eq!(numeric_binary_to_string(&bytes).unwrap(), "-0.005");

        // 10000 = [1], weight 1, dscale 0
        let bytes = numeric_bytes(1, 1, 0, 0, &[1]);
        assert_eq!(numeric_binary_to_string(&bytes).unwrap(), "10000");
    }

    #[test]
    fn test_numeric_text_to_json() {
        assert_eq!(numeric_text_to_json("42"), Some(json!(42)));
        assert_eq!(numeric_text_to_json("1.5"), Some(json!(1.5)));
        assert_eq!(numeric_text_to_json("NaN"), Some(json!("NaN")));
    }
}
