//! Conversion utilities for tool arguments and query results.
//!
//! Extracts typed arguments from the JSON argument map of a tool call, and
//! converts DuckDB values to JSON for MCP responses.

use duckdb::types::{TimeUnit, ValueRef};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{McpError, Result};

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get a required number argument from JSON arguments.
pub fn get_f64_arg(args: &Map<String, JsonValue>, name: &str) -> Result<f64> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(McpError::MissingArg(name.to_string())),
        Some(v) => v.as_f64().ok_or_else(|| McpError::InvalidArg {
            name: name.to_string(),
            reason: "Expected a number".to_string(),
        }),
    }
}

/// Helper to get an optional BFS number argument.
///
/// Absent or null yields `None`; anything other than a non-negative integer
/// that fits a BFS number is rejected.
pub fn get_optional_bfs_number(args: &Map<String, JsonValue>, name: &str) -> Result<Option<u32>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| McpError::InvalidArg {
                name: name.to_string(),
                reason: "Expected a positive integer".to_string(),
            }),
    }
}

/// Helper to get a required EGRID argument.
pub fn get_egrid_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    let egrid = get_string_arg(args, name)?.trim().to_string();
    if !egrid.starts_with("CH") || egrid.len() <= 2 {
        return Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("'{}' is not an EGRID (must start with 'CH')", egrid),
        });
    }
    Ok(egrid)
}

/// Convert one DuckDB column value to JSON.
pub fn value_ref_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Boolean(v) => JsonValue::Bool(v),
        ValueRef::TinyInt(v) => JsonValue::from(v),
        ValueRef::SmallInt(v) => JsonValue::from(v),
        ValueRef::Int(v) => JsonValue::from(v),
        ValueRef::BigInt(v) => JsonValue::from(v),
        ValueRef::HugeInt(v) => i64::try_from(v)
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::String(v.to_string())),
        ValueRef::UTinyInt(v) => JsonValue::from(v),
        ValueRef::USmallInt(v) => JsonValue::from(v),
        ValueRef::UInt(v) => JsonValue::from(v),
        ValueRef::UBigInt(v) => JsonValue::from(v),
        ValueRef::Float(v) => float_to_json(v as f64),
        ValueRef::Double(v) => float_to_json(v),
        ValueRef::Decimal(v) => v
            .to_string()
            .parse::<f64>()
            .map(float_to_json)
            .unwrap_or_else(|_| JsonValue::String(v.to_string())),
        ValueRef::Text(v) => JsonValue::String(String::from_utf8_lossy(v).to_string()),
        ValueRef::Date32(days) => {
            // Days since 1970-01-01; 719163 is that date's day number from CE
            match chrono::NaiveDate::from_num_days_from_ce_opt(719163 + days) {
                Some(date) => JsonValue::String(date.format("%Y-%m-%d").to_string()),
                None => JsonValue::from(days),
            }
        }
        ValueRef::Timestamp(unit, v) => {
            let micros = to_micros(unit, v);
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => JsonValue::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => JsonValue::from(micros),
            }
        }
        other => {
            tracing::warn!("DuckDB value {:?} mapped to debug string", other);
            JsonValue::String(format!("{:?}", other))
        }
    }
}

fn to_micros(unit: TimeUnit, v: i64) -> i64 {
    match unit {
        TimeUnit::Second => v * 1_000_000,
        TimeUnit::Millisecond => v * 1_000,
        TimeUnit::Microsecond => v,
        TimeUnit::Nanosecond => v / 1_000,
    }
}

fn float_to_json(v: f64) -> JsonValue {
    Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}
