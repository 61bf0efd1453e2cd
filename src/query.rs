//! Analytic queries over the published Parquet geodata.
//!
//! Each query opens its own in-memory DuckDB connection on a blocking thread,
//! loads the configured extensions and drops the connection when done.

use std::time::Instant;

use duckdb::types::Value;
use duckdb::Connection;
use serde_json::{Map, Value as JsonValue};
use tracing::debug_span;

use crate::config::GeoportalConfig;
use crate::convert::value_ref_to_json;
use crate::error::Result;

/// Parquet datasets of the geoportal download service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// ADMGDE: municipality statistics.
    Municipalities,
    /// MOPUBE: land cover (building footprints).
    LandCover,
    /// MOPUBE: real estate parcels.
    Parcels,
    /// NATGEFKA: hazard areas per hazard process.
    HazardAreas,
    /// NATGEFKA: synoptic hazard areas (maximum level over all processes).
    HazardSynopsis,
    /// GEOSOND: borehole profiles.
    Boreholes,
}

impl Dataset {
    /// Path of the dataset relative to the geofiles base.
    pub fn path(self) -> &'static str {
        match self {
            Dataset::Municipalities => "ADMGDE/admgde_gdedat.parquet",
            Dataset::LandCover => "MOPUBE/mopube_bbf.parquet",
            Dataset::Parcels => "MOPUBE/mopube_lif.parquet",
            Dataset::HazardAreas => "NATGEFKA/natgefka_gefgeb.parquet",
            Dataset::HazardSynopsis => "NATGEFKA/natgefka_sygefgeb.parquet",
            Dataset::Boreholes => "GEOSOND/geosond_geosond.parquet",
        }
    }
}

/// Rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column names in select order.
    pub columns: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    /// Turn each row into a flat column-name → value mapping.
    pub fn into_records(self) -> Vec<JsonValue> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let record: Map<String, JsonValue> = columns.iter().cloned().zip(row).collect();
                JsonValue::Object(record)
            })
            .collect()
    }
}

/// Executes parameterized SQL against the geodata files.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    geofiles_url: String,
    extensions: Vec<String>,
}

impl QueryEngine {
    /// Create an engine from the server configuration.
    pub fn new(config: &GeoportalConfig) -> Self {
        Self {
            geofiles_url: config.geofiles_url.trim_end_matches('/').to_string(),
            extensions: config.extensions.clone(),
        }
    }

    /// Location of a dataset as a quoted SQL string literal, ready for a `FROM` clause.
    pub fn dataset(&self, dataset: Dataset) -> String {
        let location = format!("{}/{}", self.geofiles_url, dataset.path());
        format!("'{}'", location.replace('\'', "''"))
    }

    /// Run a query on a blocking thread and collect all rows.
    pub async fn query(&self, sql: String, params: Vec<Value>) -> Result<QueryResult> {
        let extensions = self.extensions.clone();
        tokio::task::spawn_blocking(move || run_query(&extensions, &sql, &params)).await?
    }
}

fn open_connection(extensions: &[String]) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    for ext in extensions {
        conn.execute_batch(&format!("INSTALL {ext}; LOAD {ext};"))?;
    }
    Ok(conn)
}

fn run_query(extensions: &[String], sql: &str, params: &[Value]) -> Result<QueryResult> {
    let span = debug_span!(
        "db.query",
        params = params.len(),
        duration_ms = tracing::field::Empty
    );
    let _guard = span.enter();
    let start = Instant::now();

    let conn = open_connection(extensions)?;
    let mut stmt = conn.prepare(sql)?;
    let param_refs: Vec<&dyn duckdb::ToSql> =
        params.iter().map(|v| v as &dyn duckdb::ToSql).collect();

    let mut rows_iter = stmt.query(param_refs.as_slice())?;

    let columns: Vec<String> = match rows_iter.as_ref() {
        Some(stmt_ref) => (0..stmt_ref.column_count())
            .map(|i| {
                stmt_ref
                    .column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect(),
        None => return Ok(QueryResult::default()),
    };

    let mut rows = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(value_ref_to_json(row.get_ref(i)?));
        }
        rows.push(values);
    }

    span.record("duration_ms", start.elapsed().as_millis() as u64);
    Ok(QueryResult { columns, rows })
}
