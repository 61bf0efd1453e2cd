//! Municipality statistics tools (geoproduct ADMGDE).
//!
//! Tools: geo_municipality_stats

use duckdb::types::Value;
use serde_json::{Map, Value as JsonValue};

use crate::convert::get_optional_bfs_number;
use crate::error::{McpError, Result};
use crate::query::Dataset;
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Get all municipality tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "geo_municipality_stats",
        "Statistical and administrative information for the municipalities of the Canton of \
         Bern: BFS number, name, population, population density per ha, area in ha and website. \
         Pass bfs_number (see geo_resolve_municipality) to get a single municipality.",
        schema!(object {
            optional: { "bfs_number": integer }
        }),
    )]
}

/// Dispatch a municipality tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "geo_municipality_stats" => {
            let bfs_number = get_optional_bfs_number(&args, "bfs_number")?;
            let engine = session.engine();

            let mut sql = format!(
                "select bfsnr as bfs_number, gemname as municipality, espop as population, \
                 espop_gmfl as population_density_per_ha, gmdflaeche as area_ha, url as website \
                 from {}",
                engine.dataset(Dataset::Municipalities)
            );
            let mut params = Vec::new();
            if let Some(bfs) = bfs_number {
                sql.push_str(" where bfsnr = ?");
                params.push(Value::BigInt(i64::from(bfs)));
            }
            sql.push_str(" order by gemname");

            let result = engine.query(sql, params).await?;
            Ok(JsonValue::Array(result.into_records()))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
