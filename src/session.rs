//! Geoportal session.
//!
//! Bundles the REST client and the query engine used by the tools, and
//! composes the multi-step lookups (search → candidate → coordinate → EGRID).

use tracing::debug;

use crate::client::GeoportalClient;
use crate::config::GeoportalConfig;
use crate::error::Result;
use crate::query::QueryEngine;
use crate::resolve::{self, Resolution, ResolvedAddress, ResolvedMunicipality};

/// Search origin restricting results to municipalities.
pub const MUNICIPALITY_ORIGIN: &str = "grenz5";

/// Handles shared by all tool calls.
///
/// Holds no per-call state, so a single session serves concurrent calls.
#[derive(Debug, Clone)]
pub struct GeoSession {
    client: GeoportalClient,
    engine: QueryEngine,
}

impl GeoSession {
    /// Create a session from a validated configuration.
    pub fn new(config: &GeoportalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: GeoportalClient::new(config)?,
            engine: QueryEngine::new(config),
        })
    }

    /// REST client for the geoportal services.
    pub fn client(&self) -> &GeoportalClient {
        &self.client
    }

    /// Query engine for the Parquet datasets.
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Resolve a municipality name to its BFS number.
    pub async fn resolve_municipality(
        &self,
        search_text: &str,
    ) -> Result<Resolution<ResolvedMunicipality>> {
        let candidates = self
            .client
            .search(search_text, Some(MUNICIPALITY_ORIGIN))
            .await?;
        debug!(searchtext = search_text, candidates = candidates.len(), "Resolving municipality");
        resolve::resolve_municipality(search_text, &candidates)
    }

    /// Resolve an address to its parcel identifier and coordinate.
    pub async fn resolve_address(&self, search_text: &str) -> Result<Resolution<ResolvedAddress>> {
        let candidates = self.client.search(search_text, None).await?;
        debug!(searchtext = search_text, candidates = candidates.len(), "Resolving address");

        let candidate = match resolve::match_address(search_text, &candidates)? {
            Resolution::Resolved(candidate) => candidate,
            Resolution::Ambiguous(choices) => return Ok(Resolution::Ambiguous(choices)),
        };

        let egrid = self.coordinate_to_egrid(candidate.x, candidate.y).await?;
        Ok(Resolution::Resolved(ResolvedAddress {
            egrid,
            x: candidate.x,
            y: candidate.y,
        }))
    }

    /// Look up the parcel identifier at a coordinate.
    pub async fn coordinate_to_egrid(&self, x: f64, y: f64) -> Result<String> {
        self.client.egrid_for_coordinate(x, y).await
    }
}
