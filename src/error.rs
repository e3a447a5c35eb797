//! # Error Types
//!
//! Error handling for the transport layer.
//!
//! This module defines all error variants that can occur during transport
//! operations, from low-level I/O failures to handshake violations.
//!
//! All errors implement `std::error::Error` for interoperability. Most of them
//! are only ever observed indirectly: a read or write failure closes the socket
//! locally and surfaces to the application as `is_connected() == false`.

use std::io;
use thiserror::Error;

/// TransportError is the primary error type for all transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to resolve target: {0}")]
    Resolution(String),

    #[error("Handshake validation failed")]
    HandshakeFailed,

    #[error("Unknown message id: {0:#010x}")]
    UnknownMessageId(u32),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using TransportError
pub type Result<T> = std::result::Result<T, TransportError>;
