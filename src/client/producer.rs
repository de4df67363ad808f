//! Producing client
//!
//! Connects to a relay, registers as the producer for a topic, then writes
//! opaque payload chunks. Each chunk is NUL-terminated on the wire so
//! padding stays distinguishable from data; chunk boundaries beyond that
//! are transport-defined.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::wire::{self, Payload, Registration, Role};

/// Client-side producer for one topic
///
/// # Example
/// ```no_run
/// use relaymq::client::ProducerClient;
///
/// # async fn example() -> relaymq::Result<()> {
/// let mut producer = ProducerClient::connect("127.0.0.1:3333", "news").await?;
/// producer.publish(b"hello").await?;
/// producer.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ProducerClient {
    stream: BufReader<TcpStream>,
    topic: String,
}

impl ProducerClient {
    /// Connect to a relay and claim `topic`.
    ///
    /// The server does not acknowledge success. If the topic is already
    /// taken it sends one error payload and closes the connection, which
    /// [`recv_reply`](Self::recv_reply) surfaces.
    pub async fn connect(addr: impl ToSocketAddrs, topic: impl Into<String>) -> Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        let topic = topic.into();

        let registration = Registration::new(Role::Producer, topic.clone());
        stream
            .write_all(&wire::encode_registration(&registration)?)
            .await?;

        tracing::debug!(topic = %topic, "Producer connected");

        Ok(Self {
            stream: BufReader::new(stream),
            topic,
        })
    }

    /// Topic this producer publishes
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Send one opaque payload chunk.
    pub async fn publish(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.write_all(b"\0").await?;
        Ok(())
    }

    /// Read the single reply the server may send before closing a
    /// rejected registration. `None` once the connection closes without
    /// a reply.
    pub async fn recv_reply(&mut self) -> Result<Option<Payload>> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(wire::decode_payload(&line)?))
    }

    /// Close the producing stream; the server tears the topic down.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
