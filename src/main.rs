use std::path::PathBuf;

use clap::Parser;
use cascade_ocr::server;
use cascade_ocr::utils::config::{AppConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "cascade-ocr")]
#[command(about = "Page OCR server with tiered line recognition")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind, overriding `host_url` from the configuration
    #[arg(long, env = "CASCADE_OCR_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade_ocr=info,tower_http=debug".into()),
        )
        .init();

    ort::init().with_name("cascade-ocr").commit()?;

    let config = AppConfig::load_or_default(&args.config)?;
    let addr = args.addr.unwrap_or_else(|| config.host_url.to_string());
    let socket_addr: std::net::SocketAddr = addr.parse()?;

    server::start_server(socket_addr, config).await?;

    Ok(())
}
