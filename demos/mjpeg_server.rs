//! MJPEG streaming server example
//!
//! Run with: cargo run --example mjpeg_server -- <FRAME_DIR> [BIND_ADDR]
//!
//! Replays the JPEG files in FRAME_DIR as a live stream.
//!
//! Examples:
//!   cargo run --example mjpeg_server -- ./frames                  # binds to 0.0.0.0:8080
//!   cargo run --example mjpeg_server -- ./frames localhost        # binds to 127.0.0.1:8080
//!   cargo run --example mjpeg_server -- ./frames 0.0.0.0:8081     # binds to 0.0.0.0:8081
//!
//! ## Watching
//!
//! Browser:  http://localhost:8080/
//! ffplay:   ffplay -f mjpeg http://localhost:8080/stream
//! Stats:    curl http://localhost:8080/stats
//!
//! Environment:
//!   MJPEG_MAX_CLIENTS  subscriber capacity (default 4)
//!   MJPEG_FPS          frame rate cap (default 20)

use std::net::SocketAddr;
use std::path::PathBuf;

use mjpeg_fanout::frame::pool::DEFAULT_FB_COUNT;
use mjpeg_fanout::frame::DirectorySource;
use mjpeg_fanout::{FanoutConfig, RegistryConfig, ServerConfig, StreamServer};

const DEFAULT_PORT: u16 = 8080;

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:8081" -> 127.0.0.1:8081
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:80" -> 0.0.0.0:80
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn print_usage() {
    eprintln!("Usage: mjpeg_server <FRAME_DIR> [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  FRAME_DIR    Directory of .jpg files to stream");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let Some(frame_dir) = args.get(1).map(PathBuf::from) else {
        print_usage();
        std::process::exit(1);
    };

    let bind_addr = match args.get(2) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_fanout=debug".parse()?)
                .add_directive("mjpeg_server=debug".parse()?),
        )
        .init();

    // Frame source failure is fatal: never start serving without frames
    let source = match DirectorySource::open(&frame_dir, DEFAULT_FB_COUNT) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Frame source initialization failed");
            std::process::exit(1);
        }
    };

    let registry_config = RegistryConfig::default().max_clients(env_number("MJPEG_MAX_CLIENTS", 4));
    let fanout_config = FanoutConfig::default().max_fps(env_number("MJPEG_FPS", 20));

    println!("Starting MJPEG server on {}", bind_addr);
    println!("Viewer: http://{}/", bind_addr);
    println!("Stream: http://{}/stream", bind_addr);
    println!();

    let server = StreamServer::with_configs(
        ServerConfig::with_addr(bind_addr),
        source,
        registry_config,
        fanout_config,
    );

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
