//! Geoproduct catalog tools.
//!
//! Tools: geo_catalog_products

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Get all catalog tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "geo_catalog_products",
        "List all geoproducts of the geoportal of the Canton of Bern. \
         Returns [{code, name}].",
        schema!(object {}),
    )]
}

/// Dispatch a catalog tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    _args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "geo_catalog_products" => {
            let products = session.client().geoproducts().await?;
            Ok(serde_json::to_value(products)?)
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
