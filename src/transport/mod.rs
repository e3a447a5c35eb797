//! # Transport Layer
//!
//! Per-socket connection state machines and the two endpoint roles built on
//! top of them.
//!
//! ## Components
//! - **Framing**: shared read/write pipelines over any byte stream
//! - **Connection**: `ServerConnection` / `ClientConnection` state machines
//! - **Server**: acceptor, connection registry, hook dispatch, broadcast
//! - **Client**: single outbound connection with its own I/O thread
//!
//! Each endpoint drives all of its socket I/O on one dedicated thread running
//! a current-thread Tokio runtime, so completion handlers for the same
//! endpoint never run concurrently. The application's threads touch only the
//! public surface; data crosses between the two domains through the
//! [`ConcurrentQueue`](crate::utils::queue::ConcurrentQueue) and each
//! connection's outbound channel.

pub mod client;
pub mod connection;
pub(crate) mod framing;
pub mod server;

pub use client::Client;
pub use connection::{ClientConnection, ConnectionState, OwnedMessage, ServerConnection};
pub use server::{Server, ServerHandler};
