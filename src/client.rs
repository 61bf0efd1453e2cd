//! HTTP client for the metawarehouse and ÖREB cadastre services.
//!
//! Every endpoint response is decoded into an explicit structure; a body that
//! does not match fails with [`McpError::UpstreamFormat`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeoportalConfig;
use crate::error::{McpError, Result};
use crate::resolve::SearchCandidate;

const SEARCH_PATH: &str = "/rpc/oereb_search";
const GEOPRODUCT_PATH: &str = "/geoportal_geoproduct";
const GETEGRID_PATH: &str = "/getegrid/json/";
const EXTRACT_PATH: &str = "/extract/xml/";
const CAPABILITIES_PATH: &str = "/capabilities/json";

/// Language of the texts taken from multilingual upstream payloads.
pub const LANGUAGE: &str = "de";

/// A topic of the ÖREB cadastre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    /// Topic code, e.g. `ch.Nutzungsplanung`.
    pub code: String,
    /// German display name, empty when the service provides none.
    pub name: String,
}

/// A geoproduct published on the geoportal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoProduct {
    /// Product code, e.g. `NATGEFKA`.
    pub code: String,
    /// German display name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct EgridResponse {
    #[serde(rename = "GetEGRIDResponse", alias = "results")]
    results: Vec<EgridEntry>,
}

#[derive(Debug, Deserialize)]
struct EgridEntry {
    egrid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CapabilitiesResponse {
    #[serde(rename = "GetCapabilitiesResponse")]
    capabilities: Capabilities,
}

#[derive(Debug, Deserialize)]
struct Capabilities {
    topic: Vec<CapabilityTopic>,
}

#[derive(Debug, Deserialize)]
struct CapabilityTopic {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Text", default)]
    text: Vec<LocalisedText>,
}

#[derive(Debug, Deserialize)]
struct LocalisedText {
    #[serde(rename = "Language")]
    language: String,
    #[serde(rename = "Text")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeoProductRecord {
    code: String,
    name: MultilingualName,
}

#[derive(Debug, Deserialize)]
struct MultilingualName {
    de: String,
}

/// Client for the geoportal REST services.
///
/// Cheap to share between concurrent tool calls; the underlying connection
/// pool is internal to [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct GeoportalClient {
    http: Client,
    metawarehouse_url: String,
    oereb_url: String,
}

impl GeoportalClient {
    /// Create a client from the server configuration.
    pub fn new(config: &GeoportalConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| McpError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            metawarehouse_url: config.metawarehouse_url.trim_end_matches('/').to_string(),
            oereb_url: config.oereb_url.trim_end_matches('/').to_string(),
        })
    }

    /// Free-text search, optionally restricted to an origin (e.g. `grenz5` for municipalities).
    pub async fn search(&self, text: &str, origins: Option<&str>) -> Result<Vec<SearchCandidate>> {
        let url = format!("{}{}", self.metawarehouse_url, SEARCH_PATH);
        let mut request = self.http.get(&url).query(&[("searchtext", text)]);
        if let Some(origins) = origins {
            request = request.query(&[("origins", origins)]);
        }

        debug!(searchtext = text, origins = ?origins, "Searching: {}", url);
        self.get_json(request, "search").await
    }

    /// Look up the parcel identifier at an LV95 coordinate.
    pub async fn egrid_for_coordinate(&self, x: f64, y: f64) -> Result<String> {
        let url = format!("{}{}", self.oereb_url, GETEGRID_PATH);
        let request = self.http.get(&url).query(&[("EN", format!("{},{}", x, y))]);

        debug!(x, y, "Looking up EGRID: {}", url);
        let response = request.send().await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(McpError::UpstreamFormat(format!(
                "no parcel found at coordinate {},{}",
                x, y
            )));
        }
        let body: EgridResponse = decode(response, "getegrid").await?;

        let entry = body.results.into_iter().next().ok_or_else(|| {
            McpError::UpstreamFormat(format!("no parcel found at coordinate {},{}", x, y))
        })?;

        entry
            .egrid
            .ok_or_else(|| McpError::Parse("getegrid result has no 'egrid' field".to_string()))
    }

    /// Fetch the ÖREB extract of a parcel as XML text.
    pub async fn extract_xml(&self, egrid: &str) -> Result<String> {
        let url = format!("{}{}", self.oereb_url, EXTRACT_PATH);
        let request = self
            .http
            .get(&url)
            .query(&[("egrid", egrid), ("lang", LANGUAGE)]);

        debug!(egrid, "Fetching extract: {}", url);
        let response = check_status(request.send().await?)?;
        Ok(response.text().await?)
    }

    /// List the topics of the ÖREB cadastre.
    pub async fn topics(&self) -> Result<Vec<Topic>> {
        let url = format!("{}{}", self.oereb_url, CAPABILITIES_PATH);

        debug!("Fetching capabilities: {}", url);
        let body: CapabilitiesResponse = self.get_json(self.http.get(&url), "capabilities").await?;

        Ok(body
            .capabilities
            .topic
            .into_iter()
            .map(|topic| {
                let name = topic
                    .text
                    .into_iter()
                    .find(|t| t.language == LANGUAGE)
                    .map(|t| t.text)
                    .unwrap_or_default();
                Topic {
                    code: topic.code,
                    name,
                }
            })
            .collect())
    }

    /// List all geoproducts of the geoportal.
    pub async fn geoproducts(&self) -> Result<Vec<GeoProduct>> {
        let url = format!("{}{}", self.metawarehouse_url, GEOPRODUCT_PATH);
        let request = self.http.get(&url).query(&[("select", "code,name")]);

        debug!("Fetching geoproducts: {}", url);
        let records: Vec<GeoProductRecord> = self.get_json(request, "geoproduct").await?;

        Ok(records
            .into_iter()
            .map(|r| GeoProduct {
                code: r.code,
                name: r.name.de,
            })
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T> {
        let response = request.send().await?;
        decode(response, endpoint).await
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(McpError::Http(format!("HTTP {}: {}", status, response.url())));
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, endpoint: &str) -> Result<T> {
    let response = check_status(response)?;
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| McpError::UpstreamFormat(format!("{} response: {}", endpoint, e)))
}
