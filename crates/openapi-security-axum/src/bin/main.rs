//! openapi-security-server - serve the OpenAPI document described by a configuration file

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use openapi_security::SpecConfig;
use openapi_security_axum::SpecServer;

/// Serve an OpenAPI document with its security schemes and requirements
#[derive(Parser, Debug)]
#[command(name = "openapi-security-server")]
#[command(version)]
#[command(about = "Serve an OpenAPI document built from a security configuration")]
struct Args {
    /// JSON or YAML configuration file; defaults are used when omitted
    #[arg(long, env = "OPENAPI_SECURITY_CONFIG")]
    config: Option<PathBuf>,

    /// Port for HTTP server
    #[arg(long, env = "OPENAPI_SECURITY_PORT", default_value = "8000")]
    port: u16,

    /// Print the document to stdout and exit
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so `--print` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration, falling back to defaults
    let config = match &args.config {
        Some(path) => SpecConfig::load(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?,
        None => SpecConfig::default(),
    };

    // Validate schemes and routes before binding the port
    let server = SpecServer::from_config(&config)
        .map_err(|e| format!("Invalid security configuration: {}", e))?
        .with_port(args.port);

    if args.print {
        println!("{}", serde_json::to_string_pretty(server.document())?);
        return Ok(());
    }

    info!(
        "{} schemes, {} routes documented",
        config.security_schemes.len(),
        config.routes.len()
    );
    server.run().await?;

    Ok(())
}
