//! Relay server example
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                    # binds to 127.0.0.1:3333
//!   cargo run --example relay_server localhost          # binds to 127.0.0.1:3333
//!   cargo run --example relay_server 127.0.0.1:3334     # binds to 127.0.0.1:3334
//!   cargo run --example relay_server 0.0.0.0:9000       # binds to 0.0.0.0:9000
//!
//! Try it with netcat:
//!
//!   # terminal 1 - producer
//!   printf '{"type":"PRODUCER","topic":"news"}' | cat - /dev/tty | nc localhost 3333
//!
//!   # terminal 2 - consumer
//!   printf '{"type":"CONSUMER","topic":"news"}' | cat - /dev/tty | nc localhost 3333
//!
//! Everything the producer types is relayed to every consumer as a JSON
//! payload frame.

use std::net::SocketAddr;

use relaymq::{RelayServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:3333
/// - "localhost:3334" -> 127.0.0.1:3334
/// - "127.0.0.1" -> 127.0.0.1:3333
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 3333;

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

fn print_usage() {
    eprintln!("Usage: relay_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 127.0.0.1:3333)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  relay_server                     # binds to 127.0.0.1:3333");
    eprintln!("  relay_server localhost           # binds to 127.0.0.1:3333");
    eprintln!("  relay_server localhost:3334      # binds to 127.0.0.1:3334");
    eprintln!("  relay_server 0.0.0.0:9000        # binds to 0.0.0.0:9000");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "127.0.0.1:3333".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relaymq=debug".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(bind_addr);

    println!("Starting relay server on {}", config.bind_addr);
    println!();
    println!("Register a producer: {{\"type\":\"PRODUCER\",\"topic\":\"news\"}}");
    println!("Register a consumer: {{\"type\":\"CONSUMER\",\"topic\":\"news\"}}");
    println!();

    let server = RelayServer::new(config);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
