//! Resolver tools turning free text or coordinates into identifiers.
//!
//! Tools: geo_resolve_municipality, geo_resolve_address, geo_resolve_coordinate

use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_f64_arg, get_string_arg};
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Get all resolver tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "geo_resolve_municipality",
            "Look up the official BFS number of a municipality in the Canton of Bern. \
             Returns {bfs_number} when the name is unambiguous, otherwise {notice, options} \
             listing the matching municipalities to choose from.",
            schema!(object {
                required: { "searchtext": string }
            }),
        ),
        ToolDef::new(
            "geo_resolve_address",
            "Look up the parcel identifier (E-GRID, starts with 'CH') and LV95 coordinate of \
             an address (format: 'Street No., Municipality'). Returns {egrid, x, y} when the \
             address is unambiguous, otherwise {notice, options} listing candidate addresses.",
            schema!(object {
                required: { "searchtext": string }
            }),
        ),
        ToolDef::new(
            "geo_resolve_coordinate",
            "Look up the parcel identifier (E-GRID) at an LV95 coordinate (x = easting, \
             y = northing). Returns {egrid, x, y}.",
            schema!(object {
                required: { "x": number, "y": number }
            }),
        ),
    ]
}

/// Dispatch a resolver tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "geo_resolve_municipality" => {
            let searchtext = get_string_arg(&args, "searchtext")?;
            let resolution = session.resolve_municipality(&searchtext).await?;
            Ok(serde_json::to_value(resolution)?)
        }

        "geo_resolve_address" => {
            let searchtext = get_string_arg(&args, "searchtext")?;
            let resolution = session.resolve_address(&searchtext).await?;
            Ok(serde_json::to_value(resolution)?)
        }

        "geo_resolve_coordinate" => {
            let x = get_f64_arg(&args, "x")?;
            let y = get_f64_arg(&args, "y")?;
            let egrid = session.coordinate_to_egrid(x, y).await?;
            Ok(serde_json::json!({ "egrid": egrid, "x": x, "y": y }))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
