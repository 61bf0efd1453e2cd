//! Disambiguation of free-text municipality and address searches.
//!
//! The upstream search returns human-readable labels that embed structured
//! tokens. The grammar of those tokens is a contract with the upstream data:
//!
//! - municipality labels end with the BFS number: one or more whitespace
//!   characters followed by a run of ASCII digits (`"Bern 351"`);
//! - address labels contain a Swiss postal code, a standalone four-digit token
//!   (`"Musterstrasse 5, 3000 Bern"`).
//!
//! A search only auto-resolves when the top-ranked candidate, once these tokens
//! are stripped, equals what the caller typed (ignoring case). Otherwise every
//! candidate label is handed back so the caller can choose.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{McpError, Result};

static BFS_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(\d+)\s*$").expect("BFS suffix pattern"));

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b\s*").expect("postal code pattern"));

/// Notice returned with an ambiguous municipality search.
pub const MUNICIPALITY_NOTICE: &str =
    "Ambiguous or imprecise municipality name. Please choose one of the following municipalities:";

/// Notice returned with an ambiguous address search.
pub const ADDRESS_NOTICE: &str =
    "Ambiguous or imprecise address. Please choose one of the following addresses:";

/// One hit of the free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Display label, possibly carrying a BFS number or postal code.
    pub label: String,
    /// Easting (LV95).
    pub x: f64,
    /// Northing (LV95).
    pub y: f64,
}

/// A municipality identified by its BFS number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMunicipality {
    /// Official BFS municipality number.
    pub bfs_number: u32,
}

/// An address resolved to its parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    /// Federal parcel identifier, starts with `CH`.
    pub egrid: String,
    /// Easting (LV95).
    pub x: f64,
    /// Northing (LV95).
    pub y: f64,
}

/// Returned instead of a resolved entity when the search is not precise enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disambiguation {
    /// Prompt asking the caller to pick one option.
    pub notice: String,
    /// Raw candidate labels in upstream order.
    pub options: Vec<String>,
}

/// Outcome of a resolver call: exactly one of a resolved entity or a disambiguation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution<T> {
    /// The search matched a single candidate.
    Resolved(T),
    /// The caller must choose among the options.
    Ambiguous(Disambiguation),
}

impl<T> Resolution<T> {
    /// Returns the resolved value, if any.
    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Ambiguous(_) => None,
        }
    }

    /// Whether the search resolved to a single entity.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Strip the trailing BFS number from a municipality label.
pub fn bare_municipality_name(label: &str) -> &str {
    match BFS_SUFFIX.find(label) {
        Some(m) => &label[..m.start()],
        None => label,
    }
}

/// Extract the trailing BFS number from a municipality label.
pub fn bfs_number_from_label(label: &str) -> Result<u32> {
    let digits = BFS_SUFFIX
        .captures(label)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| McpError::Parse(format!("no BFS number in label '{}'", label)))?;

    digits
        .as_str()
        .parse()
        .map_err(|e| McpError::Parse(format!("invalid BFS number in label '{}': {}", label, e)))
}

/// Remove postal codes and commas from a candidate label, lowercased for comparison.
pub fn normalize_address_label(label: &str) -> String {
    normalize_address_query(&POSTAL_CODE.replace_all(label, ""))
}

/// Remove commas from the caller's search text, lowercased for comparison.
///
/// Digit tokens the caller typed are kept: a postal code or house number in the
/// query must match the candidate, not be erased.
pub fn normalize_address_query(text: &str) -> String {
    text.replace(',', "").to_lowercase()
}

/// Decide whether a municipality search resolved to a single BFS number.
pub fn resolve_municipality(
    search_text: &str,
    candidates: &[SearchCandidate],
) -> Result<Resolution<ResolvedMunicipality>> {
    let first = first_candidate(search_text, candidates)?;

    let matches = candidates.len() == 1
        || bare_municipality_name(&first.label).to_lowercase() == search_text.to_lowercase();

    if !matches {
        return Ok(Resolution::Ambiguous(disambiguation(MUNICIPALITY_NOTICE, candidates)));
    }

    let bfs_number = bfs_number_from_label(&first.label)?;
    Ok(Resolution::Resolved(ResolvedMunicipality { bfs_number }))
}

/// Decide whether an address search matched its top candidate.
///
/// Returns the matching candidate; turning its coordinate into a parcel
/// identifier is left to the caller.
pub fn match_address<'a>(
    search_text: &str,
    candidates: &'a [SearchCandidate],
) -> Result<Resolution<&'a SearchCandidate>> {
    let first = first_candidate(search_text, candidates)?;

    let matches = candidates.len() == 1
        || normalize_address_label(&first.label) == normalize_address_query(search_text);

    if matches {
        Ok(Resolution::Resolved(first))
    } else {
        Ok(Resolution::Ambiguous(disambiguation(ADDRESS_NOTICE, candidates)))
    }
}

fn first_candidate<'a>(
    search_text: &str,
    candidates: &'a [SearchCandidate],
) -> Result<&'a SearchCandidate> {
    candidates
        .first()
        .ok_or_else(|| McpError::NotFound(format!("no search results for '{}'", search_text)))
}

fn disambiguation(notice: &str, candidates: &[SearchCandidate]) -> Disambiguation {
    Disambiguation {
        notice: notice.to_string(),
        options: candidates.iter().map(|c| c.label.clone()).collect(),
    }
}
