//! Consuming client
//!
//! Connects to a relay, subscribes to a topic, and reads the
//! newline-terminated payload frames the relay pushes.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::wire::{self, Payload, Registration, Role};

/// Client-side consumer for one topic
///
/// # Example
/// ```no_run
/// use relaymq::client::ConsumerClient;
///
/// # async fn example() -> relaymq::Result<()> {
/// let mut consumer = ConsumerClient::connect("127.0.0.1:3333", "news").await?;
/// while let Some(payload) = consumer.recv().await? {
///     println!("{}", payload.payload);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConsumerClient {
    stream: BufReader<TcpStream>,
    topic: String,
}

impl ConsumerClient {
    /// Connect to a relay and subscribe to `topic`.
    ///
    /// If the topic has no producer, the first [`recv`](Self::recv)
    /// returns the error payload the server sends before closing.
    pub async fn connect(addr: impl ToSocketAddrs, topic: impl Into<String>) -> Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        let topic = topic.into();

        let registration = Registration::new(Role::Consumer, topic.clone());
        stream
            .write_all(&wire::encode_registration(&registration)?)
            .await?;

        tracing::debug!(topic = %topic, "Consumer connected");

        Ok(Self {
            stream: BufReader::new(stream),
            topic,
        })
    }

    /// Topic this consumer subscribed to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next payload frame. `None` when the server closes the
    /// connection (its producer disconnected, or this consumer was cut).
    pub async fn recv(&mut self) -> Result<Option<Payload>> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(wire::decode_payload(&line)?))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::wire::decode_registration;

    use super::*;

    #[tokio::test]
    async fn test_connect_sends_registration() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let connect = tokio::spawn(async move { ConsumerClient::connect(addr, "/hello").await });
        let (mut server_side, _) = listener.accept().await.unwrap();

        let mut buf = [0u8; 512];
        let n = server_side.read(&mut buf).await.unwrap();
        let registration = decode_registration(&buf[..n]).unwrap();
        assert_eq!(registration.role, Role::Consumer);
        assert_eq!(registration.topic, "/hello");

        let consumer = connect.await.unwrap().unwrap();
        assert_eq!(consumer.topic(), "/hello");
    }

    #[tokio::test]
    async fn test_recv_splits_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut server_side, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = server_side.read(&mut buf).await.unwrap();

            // Two frames in one write still arrive as two payloads
            let mut frames = wire::encode_payload(&Payload::data("one")).unwrap();
            frames.extend(wire::encode_payload(&Payload::data("two")).unwrap());
            server_side.write_all(&frames).await.unwrap();
        });

        let mut consumer = ConsumerClient::connect(addr, "news").await.unwrap();
        assert_eq!(consumer.recv().await.unwrap().unwrap().payload, "one");
        assert_eq!(consumer.recv().await.unwrap().unwrap().payload, "two");

        server.await.unwrap();
        assert!(consumer.recv().await.unwrap().is_none());
    }
}
