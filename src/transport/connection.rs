//! Per-socket connection state machines.
//!
//! A connection is either the server-side or the client-side end of a socket,
//! and the two ends behave differently enough (id assignment, which party
//! issues the handshake challenge, what gets published inbound) that each
//! role gets its own type. They share only the framing pipelines.
//!
//! All socket I/O for a connection runs inside a single task on its
//! endpoint's I/O thread. The application's threads interact through `send`
//! (which enqueues onto the connection's outbound channel), the state
//! accessors, and `disconnect`.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::message::{Message, MessageId};
use crate::error::{Result, TransportError};
use crate::protocol::handshake;
use crate::transport::framing;
use crate::transport::server::ServerHandler;
use crate::utils::queue::ConcurrentQueue;

/// Lifecycle of a connection.
///
/// `Disconnected` is terminal and reachable from every other state on error
/// or explicit close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Socket closed, or never opened
    Disconnected = 0,
    /// Client role only: TCP connect in flight
    Connecting = 1,
    /// Socket open, handshake exchange not yet complete
    AwaitingHandshake = 2,
    /// Handshake complete, message pipelines armed
    Connected = 3,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::AwaitingHandshake,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// A message paired with the server-side connection it arrived on
#[derive(Debug, Clone)]
pub struct OwnedMessage<T: MessageId> {
    /// The connection that sent this message
    pub origin: Arc<ServerConnection<T>>,

    /// The message itself
    pub message: Message<T>,
}

impl<T: MessageId> fmt::Display for OwnedMessage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from:{} {}", self.origin.id(), self.message)
    }
}

/// Server-side end of an accepted socket.
///
/// Created by the server's accept loop. Holds the challenge issued to the
/// peer and the precomputed expected reply; the connection only reaches
/// `Connected`, and with it the registry's message stream, once the peer
/// echoes the expected value back.
#[derive(Debug)]
pub struct ServerConnection<T: MessageId> {
    id: AtomicU32,
    peer: SocketAddr,
    challenge: u64,
    expected: u64,
    state: AtomicU8,
    outbound: mpsc::UnboundedSender<Message<T>>,
    cancel: CancellationToken,
}

impl<T: MessageId> ServerConnection<T> {
    /// Wrap a freshly accepted socket's peer address in a new connection.
    ///
    /// Returns the connection handle plus the receiving end of its outbound
    /// channel, which the connection task drains onto the socket.
    pub(crate) fn accept(peer: SocketAddr) -> (Arc<Self>, mpsc::UnboundedReceiver<Message<T>>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let challenge = handshake::new_challenge();
        let connection = Arc::new(Self {
            id: AtomicU32::new(0),
            peer,
            challenge,
            expected: handshake::scramble(challenge),
            state: AtomicU8::new(ConnectionState::AwaitingHandshake as u8),
            outbound,
            cancel: CancellationToken::new(),
        });
        (connection, outbound_rx)
    }

    /// Server-assigned id, unique and monotonic across approved connections
    pub fn id(&self) -> u32 {
        self.id.load(Ordering::Acquire)
    }

    pub(crate) fn set_id(&self, id: u32) {
        self.id.store(id, Ordering::Release);
    }

    /// Address of the remote peer
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Whether the socket is still usable
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::AwaitingHandshake | ConnectionState::Connected
        )
    }

    /// Whether the peer has passed handshake validation
    pub fn is_validated(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Queue a message for delivery to the peer.
    ///
    /// Callable from any thread; the message is marshaled onto the
    /// connection's writer, which preserves send order. Dropped silently if
    /// the connection is no longer live.
    pub fn send(&self, message: Message<T>) {
        if self.is_connected() {
            let _ = self.outbound.send(message);
        }
    }

    /// Request the connection be closed. The in-flight pipelines observe the
    /// cancellation and drop the socket.
    pub fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.cancel.cancel();
    }

    /// Drive this connection to completion: handshake, then both message
    /// pipelines. Runs as one task on the server's I/O thread.
    #[instrument(skip_all, fields(peer = %self.peer))]
    pub(crate) async fn run(
        self: Arc<Self>,
        stream: TcpStream,
        outbound_rx: mpsc::UnboundedReceiver<Message<T>>,
        inbound: Arc<ConcurrentQueue<OwnedMessage<T>>>,
        handler: Arc<dyn ServerHandler<T>>,
    ) {
        let cancel = self.cancel.clone();
        let driver = Arc::clone(&self);
        let result = tokio::select! {
            res = driver.drive(stream, outbound_rx, inbound, handler) => res,
            () = cancel.cancelled() => Ok(()),
        };
        if let Err(error) = result {
            debug!(id = self.id(), error = %error, "connection closed");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    async fn drive(
        self: Arc<Self>,
        mut stream: TcpStream,
        outbound_rx: mpsc::UnboundedReceiver<Message<T>>,
        inbound: Arc<ConcurrentQueue<OwnedMessage<T>>>,
        handler: Arc<dyn ServerHandler<T>>,
    ) -> Result<()> {
        framing::write_token(&mut stream, self.challenge).await?;
        let reply = framing::read_token(&mut stream).await?;
        if reply != self.expected {
            warn!(id = self.id(), "handshake reply mismatch, dropping connection");
            return Err(TransportError::HandshakeFailed);
        }

        self.set_state(ConnectionState::Connected);
        info!(id = self.id(), "client validated");
        handler.on_client_validated(&self);

        let (read_half, write_half) = stream.into_split();
        let origin = Arc::clone(&self);
        let read = framing::read_loop(read_half, move |message| {
            inbound.push_back(OwnedMessage {
                origin: Arc::clone(&origin),
                message,
            });
        });
        let write = framing::write_loop(write_half, outbound_rx);
        tokio::select! {
            res = read => res,
            res = write => res,
        }
    }
}

/// Client-side end of a socket connected to a server.
///
/// Created by [`Client::connect`](crate::transport::client::Client::connect).
/// Answers the server's challenge and only then arms its read pipeline.
#[derive(Debug)]
pub struct ClientConnection<T: MessageId> {
    state: AtomicU8,
    outbound: mpsc::UnboundedSender<Message<T>>,
    cancel: CancellationToken,
}

impl<T: MessageId> ClientConnection<T> {
    pub(crate) fn open() -> (Arc<Self>, mpsc::UnboundedReceiver<Message<T>>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let connection = Arc::new(Self {
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            outbound,
            cancel: CancellationToken::new(),
        });
        (connection, outbound_rx)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Whether the socket is established and still usable
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::AwaitingHandshake | ConnectionState::Connected
        )
    }

    /// Queue a message for delivery to the server. Dropped silently if the
    /// connection is no longer live.
    pub fn send(&self, message: Message<T>) {
        if self.is_connected() {
            let _ = self.outbound.send(message);
        }
    }

    /// Request the connection be closed
    pub fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.cancel.cancel();
    }

    /// Drive this connection to completion: TCP connect, handshake reply,
    /// then both message pipelines. Runs on the client's I/O thread.
    pub(crate) async fn run(
        self: Arc<Self>,
        addrs: Vec<SocketAddr>,
        outbound_rx: mpsc::UnboundedReceiver<Message<T>>,
        inbound: Arc<ConcurrentQueue<Message<T>>>,
    ) {
        let cancel = self.cancel.clone();
        let driver = Arc::clone(&self);
        let result = tokio::select! {
            res = driver.drive(addrs, outbound_rx, inbound) => res,
            () = cancel.cancelled() => Ok(()),
        };
        if let Err(error) = result {
            debug!(error = %error, "connection to server closed");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    async fn drive(
        self: Arc<Self>,
        addrs: Vec<SocketAddr>,
        outbound_rx: mpsc::UnboundedReceiver<Message<T>>,
        inbound: Arc<ConcurrentQueue<Message<T>>>,
    ) -> Result<()> {
        let mut stream = connect_any(&addrs).await?;
        self.set_state(ConnectionState::AwaitingHandshake);
        debug!(peer = %stream.peer_addr()?, "connected, awaiting challenge");

        let challenge = framing::read_token(&mut stream).await?;
        framing::write_token(&mut stream, handshake::scramble(challenge)).await?;
        self.set_state(ConnectionState::Connected);

        let (read_half, write_half) = stream.into_split();
        let read = framing::read_loop(read_half, move |message| inbound.push_back(message));
        let write = framing::write_loop(write_half, outbound_rx);
        tokio::select! {
            res = read => res,
            res = write => res,
        }
    }
}

/// Try each resolved address in order, keeping the last failure
async fn connect_any(addrs: &[SocketAddr]) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => {
                debug!(%addr, error = %error, "connect attempt failed");
                last_error = Some(error);
            }
        }
    }
    Err(last_error.map_or(
        TransportError::Resolution("no addresses to connect to".to_string()),
        TransportError::Io,
    ))
}
