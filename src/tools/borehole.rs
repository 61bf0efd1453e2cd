//! Borehole profile tools (geoproduct GEOSOND).
//!
//! Tools: geo_borehole_profiles

use duckdb::types::Value;
use serde_json::{Map, Value as JsonValue};

use crate::convert::get_egrid_arg;
use crate::error::{McpError, Result};
use crate::query::Dataset;
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Search radius around the parcel, in metres.
pub const BOREHOLE_RADIUS_M: f64 = 300.0;

/// Get all borehole tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "geo_borehole_profiles",
        "Borehole profiles (geoproduct GEOSOND) within 300 m of a parcel, given its E-GRID. \
         Returns [{probe_type, probe_date, probe_depth, pdf_link}] with a link to the PDF \
         of each profile.",
        schema!(object {
            required: { "egrid": string }
        }),
    )]
}

/// Dispatch a borehole tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "geo_borehole_profiles" => {
            let egrid = get_egrid_arg(&args, "egrid")?;
            let engine = session.engine();

            let sql = format!(
                "select sond.typt_sondtyp_de as probe_type, sond.sond_datum as probe_date, \
                 sond.sond_tiefe as probe_depth, sond.url as pdf_link \
                 from {} lif \
                 join {} sond on ST_Intersects(lif.geometry, ST_Buffer(sond.geometry, ?)) \
                 where lif.egrid = ?",
                engine.dataset(Dataset::Parcels),
                engine.dataset(Dataset::Boreholes),
            );
            let params = vec![Value::Double(BOREHOLE_RADIUS_M), Value::Text(egrid)];

            let result = engine.query(sql, params).await?;
            Ok(JsonValue::Array(result.into_records()))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
