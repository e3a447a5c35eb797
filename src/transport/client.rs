//! Client endpoint: one outbound connection and its I/O thread.
//!
//! `connect` resolves the target synchronously, then hands the rest of the
//! sequence (TCP connect, handshake reply, pipelines) to a dedicated
//! thread running a current-thread Tokio runtime. The application polls
//! [`Client::messages_to_us`] and checks [`Client::is_connected`] from its
//! own threads.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;

use tracing::info;

use crate::core::message::{Message, MessageId};
use crate::error::{Result, TransportError};
use crate::transport::connection::ClientConnection;
use crate::utils::queue::ConcurrentQueue;

/// Connecting endpoint: owns one [`ClientConnection`] plus the thread that
/// drives it
pub struct Client<T: MessageId> {
    connection: Option<Arc<ClientConnection<T>>>,
    inbound: Arc<ConcurrentQueue<Message<T>>>,
    io_thread: Option<thread::JoinHandle<()>>,
}

impl<T: MessageId> Client<T> {
    /// Create a client with no connection
    pub fn new() -> Self {
        Self {
            connection: None,
            inbound: Arc::new(ConcurrentQueue::new()),
            io_thread: None,
        }
    }

    /// Connect to a server.
    ///
    /// Resolves `host:port`, then starts the connect/handshake sequence on a
    /// freshly launched I/O thread. A previous connection, if any, is torn
    /// down first. Success here means the sequence *started*; the socket is
    /// established asynchronously, observable via
    /// [`is_connected`](Self::is_connected).
    ///
    /// # Errors
    /// Returns `TransportError::Resolution` for an unresolvable target, or
    /// an I/O error if the runtime or thread cannot be created. No partial
    /// state is retained on failure.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.disconnect();

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|error| TransportError::Resolution(format!("{host}:{port}: {error}")))?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolution(format!(
                "{host}:{port} resolved to no addresses"
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;

        let (connection, outbound_rx) = ClientConnection::open();
        let driver = Arc::clone(&connection);
        let inbound = Arc::clone(&self.inbound);
        let io_thread = thread::Builder::new()
            .name("netframe-client".to_string())
            .spawn(move || {
                runtime.block_on(driver.run(addrs, outbound_rx, inbound));
            })?;

        info!(host, port, "connecting");
        self.connection = Some(connection);
        self.io_thread = Some(io_thread);
        Ok(())
    }

    /// Close the connection, join the I/O thread, and release the handle.
    /// A no-op when not connected.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
        if let Some(io_thread) = self.io_thread.take() {
            let _ = io_thread.join();
        }
    }

    /// Whether the connection is currently established
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|conn| conn.is_connected())
    }

    /// Send a message to the server. Silently dropped unless currently
    /// connected; check [`is_connected`](Self::is_connected) first.
    pub fn send(&self, message: Message<T>) {
        if let Some(connection) = &self.connection {
            if connection.is_connected() {
                connection.send(message);
            }
        }
    }

    /// The queue of messages received from the server. The client stores
    /// them but never drains this queue itself.
    pub fn messages_to_us(&self) -> &ConcurrentQueue<Message<T>> {
        &self.inbound
    }
}

impl<T: MessageId> Default for Client<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MessageId> Drop for Client<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
