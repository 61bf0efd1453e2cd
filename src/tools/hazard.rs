//! Natural hazard tools (geoproducts NATGEFKA and MOPUBE).
//!
//! Tools: geo_hazard_red_zone_buildings, geo_hazard_levels

use std::collections::BTreeMap;

use duckdb::types::Value;
use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_egrid_arg, get_optional_bfs_number};
use crate::error::{McpError, Result};
use crate::query::Dataset;
use crate::schema;
use crate::session::GeoSession;
use crate::tools::ToolDef;

/// Ordinal of the highest hazard level ("red zone").
pub const SIGNIFICANT_HAZARD: i64 = 4;

/// Land cover type of buildings in the cadastral survey.
const BUILDING_COVER_TYPE: &str = "Gebäude";

/// Readable label of a hazard level ordinal.
pub fn hazard_label(ordinal: Option<i64>) -> &'static str {
    match ordinal {
        Some(0) => "not at risk",
        Some(1) => "residual risk",
        Some(2) => "low risk",
        Some(3) => "medium risk",
        Some(4) => "significant risk",
        _ => "unknown risk level",
    }
}

/// Category used for hazard areas without a process name.
const UNKNOWN_PROCESS: &str = "unknown process";

/// Read a hazard level ordinal from a query cell.
///
/// Integer columns come through as integers; DECIMAL and DOUBLE columns as
/// floats, which only count when they hold a whole number.
fn hazard_ordinal(cell: &JsonValue) -> Option<i64> {
    if let Some(v) = cell.as_i64() {
        return Some(v);
    }
    let v = match cell {
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        other => other.as_f64()?,
    };
    (v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64).then(|| v as i64)
}

/// Decode a `(process, level)` row into a hazard category and its ordinal.
fn hazard_record(row: Vec<JsonValue>) -> (String, Option<i64>) {
    let mut cells = row.into_iter();
    let category = match cells.next() {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => name,
        _ => UNKNOWN_PROCESS.to_string(),
    };
    let ordinal = cells.next().as_ref().and_then(hazard_ordinal);
    (category, ordinal)
}

/// Keep the highest ordinal per hazard category.
///
/// A record without an ordinal never outranks one that has one.
pub fn max_level_per_category<I>(records: I) -> BTreeMap<String, Option<i64>>
where
    I: IntoIterator<Item = (String, Option<i64>)>,
{
    let mut levels: BTreeMap<String, Option<i64>> = BTreeMap::new();
    for (category, ordinal) in records {
        levels
            .entry(category)
            .and_modify(|current| *current = (*current).max(ordinal))
            .or_insert(ordinal);
    }
    levels
}

/// Get all hazard tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "geo_hazard_red_zone_buildings",
            "Count, per municipality of the Canton of Bern, the buildings that lie in a zone of \
             significant danger (red zone) on the natural hazard map. Returns \
             [{bfs_number, municipality, buildings_in_red_zone}]. Pass bfs_number to restrict \
             the count to one municipality.",
            schema!(object {
                optional: { "bfs_number": integer }
            }),
        ),
        ToolDef::new(
            "geo_hazard_levels",
            "Natural hazard level per hazard process (e.g. water, rockfall, landslide, \
             avalanche, subsidence) for a parcel, given its E-GRID. Returns {process: level}; \
             where several hazard areas overlap the parcel the highest level wins.",
            schema!(object {
                required: { "egrid": string }
            }),
        ),
    ]
}

/// Dispatch a hazard tool call.
pub async fn dispatch(
    session: &GeoSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "geo_hazard_red_zone_buildings" => {
            let bfs_number = get_optional_bfs_number(&args, "bfs_number")?;
            let engine = session.engine();

            let mut sql = format!(
                "select bbf.bfsnr as bfs_number, gde.gemname as municipality, \
                 count(gef.objectid) as buildings_in_red_zone \
                 from {} bbf \
                 join {} gde on bbf.bfsnr = gde.bfsnr \
                 join {} gef on ST_Intersects(bbf.geometry, gef.geometry) \
                 where bbf.bbartt_bez_de = ? and gef.max_gefstu = ?",
                engine.dataset(Dataset::LandCover),
                engine.dataset(Dataset::Municipalities),
                engine.dataset(Dataset::HazardSynopsis),
            );
            let mut params = vec![
                Value::Text(BUILDING_COVER_TYPE.to_string()),
                Value::BigInt(SIGNIFICANT_HAZARD),
            ];
            if let Some(bfs) = bfs_number {
                sql.push_str(" and bbf.bfsnr = ?");
                params.push(Value::BigInt(i64::from(bfs)));
            }
            sql.push_str(" group by bbf.bfsnr, gde.gemname order by gde.gemname");

            let result = engine.query(sql, params).await?;
            Ok(JsonValue::Array(result.into_records()))
        }

        "geo_hazard_levels" => {
            let egrid = get_egrid_arg(&args, "egrid")?;
            let engine = session.engine();

            let sql = format!(
                "select gef.hprozt_hproz_de as process, gef.gefstuf as level \
                 from {} lif \
                 join {} gef on ST_Intersects(lif.geometry, gef.geometry) \
                 where lif.egrid = ?",
                engine.dataset(Dataset::Parcels),
                engine.dataset(Dataset::HazardAreas),
            );
            let result = engine.query(sql, vec![Value::Text(egrid)]).await?;

            let records = result.rows.into_iter().map(hazard_record);

            let levels: Map<String, JsonValue> = max_level_per_category(records)
                .into_iter()
                .map(|(category, ordinal)| {
                    (category, JsonValue::String(hazard_label(ordinal).to_string()))
                })
                .collect();
            Ok(JsonValue::Object(levels))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
