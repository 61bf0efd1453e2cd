//! ÖREB cadastre tools (public-law restrictions on land ownership).
//!
//! Tools: oereb_topics, oereb_extract

use serde_json::{Map, Value as JsonValue};

use crate::convert::get_egrid_arg;
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Get all ÖREB tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "oereb_topics",
            "List all topics available in the ÖREB cadastre of the Canton of Bern. \
             Returns {topic_code: German name}.",
            schema!(object {}),
        ),
        ToolDef::new(
            "oereb_extract",
            "Create an extract of the ÖREB cadastre for a parcel, given its E-GRID \
             (see geo_resolve_address), listing all public-law restrictions on the property. \
             Returns the extract as XML.",
            schema!(object {
                required: { "egrid": string }
            }),
        ),
    ]
}

/// Dispatch an ÖREB tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "oereb_topics" => {
            let topics: Map<String, JsonValue> = session
                .client()
                .topics()
                .await?
                .into_iter()
                .map(|t| (t.code, JsonValue::String(t.name)))
                .collect();
            Ok(JsonValue::Object(topics))
        }

        "oereb_extract" => {
            let egrid = get_egrid_arg(&args, "egrid")?;
            let xml = session.client().extract_xml(&egrid).await?;
            Ok(JsonValue::String(xml))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
