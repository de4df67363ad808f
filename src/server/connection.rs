//! Per-connection protocol driver
//!
//! One task per accepted connection: read the registration, then drive the
//! producer or consumer role against the registry until the connection
//! ends, and unwind deterministically: unsubscribe on the consumer side,
//! disconnect plus unregister on the producer side.
//!
//! The registry lock is never held across socket I/O: the driver takes a
//! producer handle out of the registry and works against that.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::Result;
use crate::registry::{Consumer, Topic, TopicRegistry};
use crate::server::config::ServerConfig;
use crate::session::SessionState;
use crate::wire::{self, Payload, Role};

pub(crate) struct Connection {
    config: ServerConfig,
    registry: Arc<TopicRegistry>,
    state: SessionState,
}

impl Connection {
    pub(crate) fn new(
        session_id: u64,
        peer_addr: SocketAddr,
        config: ServerConfig,
        registry: Arc<TopicRegistry>,
    ) -> Self {
        Self {
            config,
            registry,
            state: SessionState::new(session_id, peer_addr),
        }
    }

    /// Drive the connection to completion.
    ///
    /// Protocol-level rejections close the connection and return `Ok`;
    /// only transport failures surface as errors, for the caller's log.
    pub(crate) async fn run(&mut self, socket: TcpStream) -> Result<()> {
        let result = self.drive(socket).await;

        self.state.close();
        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            role = self.state.role.map(|r| r.as_wire()),
            topic = self.state.topic.as_ref().map(|t| t.as_str()),
            duration_ms = self.state.duration().as_millis() as u64,
            bytes_received = self.state.bytes_received,
            payloads = self.state.payloads_relayed,
            "Connection closed"
        );

        result
    }

    async fn drive(&mut self, mut socket: TcpStream) -> Result<()> {
        // Registration phase: exactly one chunk, within the deadline
        let mut buf = BytesMut::with_capacity(self.config.read_buffer_size);
        let n = match timeout(self.config.registration_timeout, socket.read_buf(&mut buf)).await {
            Ok(read) => read?,
            Err(_) => {
                tracing::debug!(session_id = self.state.id, "Registration timed out");
                return Ok(());
            }
        };
        if n == 0 {
            tracing::debug!(session_id = self.state.id, "Closed before registering");
            return Ok(());
        }
        self.state.add_bytes_received(n);

        let registration = match wire::decode_registration(&buf) {
            Ok(registration) => registration,
            Err(e) => {
                // Malformed or unknown role: silent disconnect, no response
                tracing::warn!(
                    session_id = self.state.id,
                    peer = %self.state.peer_addr,
                    error = %e,
                    "Invalid registration, dropping connection"
                );
                return Ok(());
            }
        };

        let topic = Topic::new(registration.topic);
        tracing::debug!(
            session_id = self.state.id,
            role = registration.role.as_wire(),
            topic = %topic,
            "Client registered"
        );

        match registration.role {
            Role::Producer => self.run_producer(socket, topic).await,
            Role::Consumer => self.run_consumer(socket, topic).await,
        }
    }

    /// Producer role: claim the topic, then relay every non-empty read
    /// chunk to the topic's subscribers until the connection ends.
    async fn run_producer(&mut self, mut socket: TcpStream, topic: Topic) -> Result<()> {
        let producer = match self.registry.register(&topic).await {
            Ok(producer) => producer,
            Err(e) => {
                tracing::warn!(
                    session_id = self.state.id,
                    topic = %topic,
                    "Topic already has a producer, rejecting"
                );
                return Self::reject(&mut socket, e.code()).await;
            }
        };
        self.state.start_producing(topic.clone());

        let mut buf = BytesMut::with_capacity(self.config.read_buffer_size);
        let outcome: Result<()> = loop {
            buf.clear();
            match self.read_chunk(&mut socket, &mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    self.state.add_bytes_received(n);
                    let chunk = wire::trim_chunk(&buf);
                    if chunk.is_empty() {
                        continue;
                    }
                    let payload = Payload::data(String::from_utf8_lossy(chunk));
                    producer.push(payload).await;
                    self.state.add_payload_relayed();
                }
                Err(e) => break Err(e.into()),
            }
        };

        // Teardown happens exactly once, however the loop ended: release
        // every subscriber, then free the topic for the next producer.
        producer.disconnect().await;
        self.registry.unregister(&topic).await;

        outcome
    }

    /// Consumer role: subscribe an armed consumer whose sink writes
    /// payload frames to the socket, then wait for either side to finish.
    async fn run_consumer(&mut self, socket: TcpStream, topic: Topic) -> Result<()> {
        let mut socket = socket;
        let producer = match self.registry.lookup(&topic).await {
            Ok(producer) => producer,
            Err(e) => {
                tracing::warn!(
                    session_id = self.state.id,
                    topic = %topic,
                    "No producer for topic, rejecting consumer"
                );
                return Self::reject(&mut socket, e.code()).await;
            }
        };
        self.state.start_consuming(topic.clone());

        let (mut read_half, write_half) = socket.into_split();

        // The delivery task owns the write half; when the queue closes and
        // the task ends, dropping the writer sends FIN to the client.
        let writer = Arc::new(tokio::sync::Mutex::new(write_half));
        let capacity = self.registry.config().queue_capacity;
        let (consumer, mut delivery) = Consumer::spawn(capacity, move |payload| {
            let writer = Arc::clone(&writer);
            async move {
                let frame = wire::encode_payload(&payload)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writer.lock().await.write_all(&frame).await
            }
        });
        let consumer_id = consumer.id();
        producer.subscribe(consumer).await;

        tracing::info!(
            session_id = self.state.id,
            topic = %topic,
            consumer_id = %consumer_id,
            "Consumer subscribed"
        );

        // Inbound bytes on a consumer connection are ignored; reading only
        // watches for EOF. The delivery task ending means the producer
        // disconnected, which also finishes the connection.
        let mut buf = BytesMut::with_capacity(self.config.read_buffer_size);
        let outcome: Result<()> = loop {
            tokio::select! {
                read = read_half.read_buf(&mut buf) => match read {
                    Ok(0) => break Ok(()),
                    Ok(n) => {
                        self.state.add_bytes_received(n);
                        buf.clear();
                    }
                    Err(e) => break Err(e.into()),
                },
                _ = &mut delivery => break Ok(()),
            }
        };

        producer.unsubscribe(consumer_id).await;

        outcome
    }

    /// One read chunk, bounded by the idle timeout when one is configured.
    async fn read_chunk(
        &self,
        socket: &mut TcpStream,
        buf: &mut BytesMut,
    ) -> std::io::Result<usize> {
        if self.config.idle_timeout.is_zero() {
            return socket.read_buf(buf).await;
        }
        match timeout(self.config.idle_timeout, socket.read_buf(buf)).await {
            Ok(read) => read,
            Err(_) => {
                tracing::debug!(session_id = self.state.id, "Producer idle, disconnecting");
                Ok(0)
            }
        }
    }

    /// Send the single error payload a rejected connection gets, then
    /// close the stream.
    async fn reject(socket: &mut TcpStream, code: &str) -> Result<()> {
        let frame = wire::encode_payload(&Payload::error(code))?;
        socket.write_all(&frame).await?;
        socket.shutdown().await?;
        Ok(())
    }
}
