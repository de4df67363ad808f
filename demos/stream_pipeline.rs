//! Producer/consumer pipeline example
//!
//! Run with: cargo run --example stream_pipeline
//!
//! Starts a relay on an ephemeral port, attaches a producer and a
//! consumer to the "/hello" topic, and relays ten messages end to end.

use std::time::Duration;

use relaymq::client::{ConsumerClient, ProducerClient};
use relaymq::{RelayServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relaymq=info".parse()?),
        )
        .init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = RelayServer::new(ServerConfig::with_addr(addr));
    tokio::spawn(async move {
        if let Err(e) = server.run_on(listener).await {
            eprintln!("Server error: {}", e);
        }
    });

    let mut producer = ProducerClient::connect(addr, "/hello").await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut consumer = ConsumerClient::connect(addr, "/hello").await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let relay = tokio::spawn(async move {
        for i in 0..10 {
            let message = format!("Hello, world! #{}", i);
            producer.publish(message.as_bytes()).await?;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        producer.shutdown().await
    });

    while let Some(payload) = consumer.recv().await? {
        if payload.error {
            eprintln!("Relay error: {}", payload.payload);
            break;
        }
        println!("Received: {}", payload.payload);
    }
    println!("Producer disconnected, stream closed.");

    relay.await??;
    Ok(())
}
