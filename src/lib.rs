//! # geoportal-mcp
//!
//! MCP (Model Context Protocol) server for the geoportal of the Canton of Bern.
//!
//! This crate exposes geodata and ÖREB cadastre lookups as tools for AI agents.
//! It implements the MCP protocol over stdin/stdout using JSON-RPC 2.0.
//!
//! ## Features
//!
//! - **Resolvers**: municipality name → BFS number, address → E-GRID and coordinate,
//!   coordinate → E-GRID. Ambiguous searches return the candidates to choose from
//!   instead of guessing.
//! - **Analytic tools**: municipality statistics, natural hazard levels and red-zone
//!   building counts, borehole profiles, computed with DuckDB over the published
//!   Parquet datasets.
//! - **ÖREB cadastre**: topic catalog and full parcel extracts.
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "geoportal": {
//!       "command": "/path/to/geoportal-mcp"
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use geoportal_mcp::{GeoSession, GeoportalConfig, McpServer};
//!
//! let session = GeoSession::new(&GeoportalConfig::default()).expect("Invalid configuration");
//! let server = McpServer::new(session);
//!
//! // Run the server (reads from stdin, writes to stdout)
//! // server.run().await.expect("Server error");
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod query;
pub mod resolve;
pub mod server;
pub mod session;
pub mod tools;

pub use client::{GeoProduct, GeoportalClient, Topic};
pub use config::GeoportalConfig;
pub use error::{McpError, Result};
pub use query::{Dataset, QueryEngine, QueryResult};
pub use resolve::{
    Disambiguation, Resolution, ResolvedAddress, ResolvedMunicipality, SearchCandidate,
};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::GeoSession;
pub use tools::{ToolDef, ToolRegistry};
