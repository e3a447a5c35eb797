//! # Protocol Logic
//!
//! Connection-level protocol pieces that sit above raw framing: the
//! challenge/response handshake a server uses to validate freshly accepted
//! sockets.

pub mod handshake;
