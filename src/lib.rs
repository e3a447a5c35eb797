//! # netframe
//!
//! Asynchronous, bidirectional, typed-message network transport shared by a
//! client and a server role: byte-stream framing, a per-socket connection
//! state machine with mutual handshake validation, and a server-side
//! connection registry with broadcast fan-out.
//!
//! ## Design
//! - Messages are a fixed header (application-defined id + body length) plus
//!   a flat byte body; values are pushed and popped in stack order with no
//!   per-field framing. See [`core::message`].
//! - Each endpoint drives all socket I/O on one dedicated thread; inbound
//!   messages cross to the application through a mutex-guarded
//!   [`ConcurrentQueue`].
//! - The server validates every accepted socket with a challenge/response
//!   handshake before it can deliver a single message. See
//!   [`protocol::handshake`].
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use netframe::config::ServerConfig;
//! use netframe::{Client, Message, MessageId, Server, ServerConnection, ServerHandler};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum GameMsg {
//!     Ping,
//! }
//!
//! impl MessageId for GameMsg {
//!     fn to_u32(self) -> u32 {
//!         self as u32
//!     }
//!     fn from_u32(raw: u32) -> Option<Self> {
//!         match raw {
//!             0 => Some(GameMsg::Ping),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! struct Echo;
//!
//! impl ServerHandler<GameMsg> for Echo {
//!     fn on_client_connect(&self, _connection: &Arc<ServerConnection<GameMsg>>) -> bool {
//!         true
//!     }
//!     fn on_message(&self, connection: &Arc<ServerConnection<GameMsg>>, message: Message<GameMsg>) {
//!         connection.send(message);
//!     }
//! }
//!
//! fn main() -> netframe::Result<()> {
//!     let mut server = Server::new(ServerConfig::default(), Echo);
//!     server.start()?;
//!
//!     let mut client = Client::new();
//!     client.connect("127.0.0.1", 36676)?;
//!     client.send(Message::new(GameMsg::Ping));
//!
//!     loop {
//!         server.update(usize::MAX, true);
//!     }
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::message::{Message, MessageHeader, MessageId, HEADER_LEN};
pub use crate::error::{Result, TransportError};
pub use crate::transport::client::Client;
pub use crate::transport::connection::{
    ClientConnection, ConnectionState, OwnedMessage, ServerConnection,
};
pub use crate::transport::server::{Server, ServerHandler};
pub use crate::utils::queue::ConcurrentQueue;
