//! Server endpoint: acceptor, connection registry, and hook dispatch.
//!
//! The server owns one I/O thread running a current-thread Tokio runtime.
//! The accept loop and every connection task live there; the application
//! calls the public methods from its own threads and receives callbacks
//! through its [`ServerHandler`].

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::{ServerConfig, FIRST_CLIENT_ID};
use crate::core::message::{Message, MessageId};
use crate::error::Result;
use crate::transport::connection::{OwnedMessage, ServerConnection};
use crate::utils::queue::ConcurrentQueue;

/// Callbacks the embedding application supplies to a [`Server`].
///
/// All methods have default bodies, mirroring an application that overrides
/// only what it needs. Note the default accept decision is to **deny**.
///
/// `on_client_connect` and `on_client_validated` are invoked from the
/// server's I/O thread; `on_message` from whichever thread calls
/// [`Server::update`]; `on_client_disconnect` from whichever thread noticed
/// the dead connection. Implementations must therefore be `Send + Sync`.
pub trait ServerHandler<T: MessageId>: Send + Sync + 'static {
    /// Called for every accepted socket, before the handshake. Return `true`
    /// to approve the connection; a denied connection is dropped on the
    /// floor and consumes no id.
    fn on_client_connect(&self, connection: &Arc<ServerConnection<T>>) -> bool {
        let _ = connection;
        false
    }

    /// Called once a client has answered the handshake challenge correctly
    fn on_client_validated(&self, connection: &Arc<ServerConnection<T>>) {
        let _ = connection;
    }

    /// Called when a client is found dead during a send pass
    fn on_client_disconnect(&self, connection: &Arc<ServerConnection<T>>) {
        let _ = connection;
    }

    /// Called for each inbound message dispatched by [`Server::update`]
    fn on_message(&self, connection: &Arc<ServerConnection<T>>, message: Message<T>) {
        let _ = (connection, message);
    }
}

// Dead entries are nulled in place during a send pass and compacted in one
// sweep afterwards, so a broadcast stays a single pass over the slots.
type Registry<T> = Arc<Mutex<Vec<Option<Arc<ServerConnection<T>>>>>>;

/// Accepting endpoint: listens on a fixed address, validates clients, and
/// fans messages in and out
pub struct Server<T: MessageId> {
    config: ServerConfig,
    handler: Arc<dyn ServerHandler<T>>,
    registry: Registry<T>,
    inbound: Arc<ConcurrentQueue<OwnedMessage<T>>>,
    cancel: CancellationToken,
    local_addr: Option<SocketAddr>,
    io_thread: Option<thread::JoinHandle<()>>,
}

impl<T: MessageId> Server<T> {
    /// Create a server that will bind per `config` and call back into
    /// `handler`. Nothing happens until [`start`](Self::start).
    pub fn new(config: ServerConfig, handler: impl ServerHandler<T>) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            registry: Arc::new(Mutex::new(Vec::new())),
            inbound: Arc::new(ConcurrentQueue::new()),
            cancel: CancellationToken::new(),
            local_addr: None,
            io_thread: None,
        }
    }

    /// Bind the listener and launch the I/O thread with its accept loop.
    ///
    /// Bind and thread-spawn failures surface here; everything later is
    /// asynchronous and visible only through the handler hooks.
    pub fn start(&mut self) -> Result<()> {
        if self.io_thread.is_some() {
            return Ok(());
        }

        let listener =
            std::net::TcpListener::bind((self.config.address.as_str(), self.config.port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;

        let handler = Arc::clone(&self.handler);
        let registry = Arc::clone(&self.registry);
        let inbound = Arc::clone(&self.inbound);
        let cancel = self.cancel.clone();

        let io_thread = thread::Builder::new()
            .name("netframe-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    tokio::select! {
                        () = accept_loop(listener, handler, registry, inbound) => {}
                        () = cancel.cancelled() => {}
                    }
                });
            })?;
        self.io_thread = Some(io_thread);

        info!(address = %local_addr, "server started");
        Ok(())
    }

    /// Stop accepting, tear down every connection, and join the I/O thread
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(io_thread) = self.io_thread.take() {
            let _ = io_thread.join();
            self.lock_registry().clear();
            info!("server stopped");
        }
    }

    /// Address the listener is bound to, once started. Useful with an
    /// ephemeral-port configuration.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Send a message to one client.
    ///
    /// If the client turns out to be dead it gets the disconnect hook and is
    /// removed from the registry instead.
    pub fn send_message(&self, to: &Arc<ServerConnection<T>>, message: Message<T>) {
        if to.is_connected() {
            to.send(message);
        } else {
            self.handler.on_client_disconnect(to);
            let mut registry = self.lock_registry();
            for slot in registry.iter_mut() {
                if slot.as_ref().is_some_and(|conn| Arc::ptr_eq(conn, to)) {
                    *slot = None;
                }
            }
            registry.retain(Option::is_some);
        }
    }

    /// Send a message to every live client, optionally excluding one.
    ///
    /// A single pass over the registry; clients found dead during the pass
    /// get the disconnect hook and are nulled in place, then one compaction
    /// sweep removes the holes.
    pub fn send_message_all(
        &self,
        message: &Message<T>,
        exclude: Option<&Arc<ServerConnection<T>>>,
    ) {
        let mut reaped = Vec::new();
        {
            let mut registry = self.lock_registry();
            for slot in registry.iter_mut() {
                let Some(conn) = slot else { continue };
                if conn.is_connected() {
                    let excluded = exclude.is_some_and(|skip| Arc::ptr_eq(skip, conn));
                    if !excluded {
                        conn.send(message.clone());
                    }
                } else {
                    reaped.push(Arc::clone(conn));
                    *slot = None;
                }
            }
            if !reaped.is_empty() {
                registry.retain(Option::is_some);
            }
        }
        // Hooks run outside the registry lock so they may call back in
        for conn in &reaped {
            self.handler.on_client_disconnect(conn);
        }
    }

    /// Dispatch up to `max_messages` queued inbound messages to the message
    /// hook, in arrival order. With `wait` set, blocks until at least one
    /// message is queued. Returns the number dispatched.
    pub fn update(&self, max_messages: usize, wait: bool) -> usize {
        if wait {
            self.inbound.wait();
        }
        let mut dispatched = 0;
        while dispatched < max_messages {
            let Some(owned) = self.inbound.pop_front() else {
                break;
            };
            self.handler.on_message(&owned.origin, owned.message);
            dispatched += 1;
        }
        dispatched
    }

    fn lock_registry(&self) -> MutexGuard<'_, Vec<Option<Arc<ServerConnection<T>>>>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: MessageId> Drop for Server<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Accept clients until cancelled, re-arming after every outcome.
///
/// Approved connections get the next id and a task of their own; denied
/// sockets are dropped on the spot.
#[instrument(skip_all)]
async fn accept_loop<T: MessageId>(
    listener: std::net::TcpListener,
    handler: Arc<dyn ServerHandler<T>>,
    registry: Registry<T>,
    inbound: Arc<ConcurrentQueue<OwnedMessage<T>>>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(error) => {
            error!(error = %error, "failed to register listener with the I/O loop");
            return;
        }
    };

    let mut next_id = FIRST_CLIENT_ID;
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "new connection");
                let (connection, outbound_rx) = ServerConnection::accept(peer);
                if handler.on_client_connect(&connection) {
                    connection.set_id(next_id);
                    next_id += 1;
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(Some(Arc::clone(&connection)));
                    info!(id = connection.id(), %peer, "connection approved");
                    tokio::spawn(connection.run(
                        stream,
                        outbound_rx,
                        Arc::clone(&inbound),
                        Arc::clone(&handler),
                    ));
                } else {
                    info!(%peer, "connection denied");
                }
            }
            Err(error) => {
                error!(error = %error, "error accepting connection");
            }
        }
    }
}
