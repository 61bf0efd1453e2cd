//! MCP server for the geoportal of the Canton of Bern.
//!
//! Run with `geoportal-mcp`; upstream endpoints can be overridden with flags or
//! environment variables.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use geoportal_mcp::config::{
    DEFAULT_GEOFILES_URL, DEFAULT_METAWAREHOUSE_URL, DEFAULT_OEREB_URL, DEFAULT_TIMEOUT_SECS,
};
use geoportal_mcp::{GeoSession, GeoportalConfig, McpServer};

/// MCP server for the geoportal of the Canton of Bern.
///
/// Exposes geodata and ÖREB cadastre lookups as MCP tools for AI agents.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "geoportal-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the metawarehouse (search and geoproduct catalog).
    #[arg(long, env = "GEOPORTAL_METAWAREHOUSE_URL", default_value = DEFAULT_METAWAREHOUSE_URL)]
    metawarehouse_url: String,

    /// Base URL of the ÖREB cadastre service.
    #[arg(long, env = "GEOPORTAL_OEREB_URL", default_value = DEFAULT_OEREB_URL)]
    oereb_url: String,

    /// Base URL or local directory of the Parquet geodata files.
    #[arg(long, env = "GEOPORTAL_GEOFILES_URL", default_value = DEFAULT_GEOFILES_URL)]
    geofiles_url: String,

    /// Timeout for upstream HTTP requests, in seconds.
    #[arg(long, env = "GEOPORTAL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Set up logging; stdout carries the protocol
    let filter = if args.verbose {
        EnvFilter::new("geoportal_mcp=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = GeoportalConfig {
        metawarehouse_url: args.metawarehouse_url,
        oereb_url: args.oereb_url,
        geofiles_url: args.geofiles_url,
        timeout_secs: args.timeout_secs,
        ..Default::default()
    };

    let session = match GeoSession::new(&config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        metawarehouse = %config.metawarehouse_url,
        oereb = %config.oereb_url,
        geofiles = %config.geofiles_url,
        "Starting geoportal-mcp"
    );

    let server = McpServer::new(session);

    // Run the server
    if let Err(e) = server.run().await {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
