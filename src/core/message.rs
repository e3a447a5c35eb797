//! Typed messages and their wire framing.
//!
//! A [`Message`] is a header plus a flat byte body. Values are appended with
//! [`Message::push`] and recovered with [`Message::pop`] in **stack order**:
//! the last value pushed is the first value popped. There are no per-field
//! length prefixes on the wire, so sender and receiver must push and pop
//! fields in exactly mirrored order; getting the order wrong yields silently
//! wrong values, not an error.
//!
//! Only trivially-copyable fixed-size values can travel in a body. That
//! contract is enforced at build time by the [`bytemuck::Pod`] bound on
//! `push`/`pop`; types with pointers, padding, or drop glue simply do not
//! compile.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::{Result, TransportError};

/// Wire size of a [`MessageHeader`]: id (4 bytes) + body length (4 bytes)
pub const HEADER_LEN: usize = 8;

/// The application's closed message-id enumeration.
///
/// The framing layer is generic over this trait so it stays reusable across
/// different id sets. Implementations map each variant to a stable `u32`
/// wire value and back; `from_u32` returns `None` for values outside the
/// enumeration, which the read pipeline treats as a fatal framing error on
/// that connection.
pub trait MessageId: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Wire representation of this id
    fn to_u32(self) -> u32;

    /// Recover an id from its wire representation
    fn from_u32(raw: u32) -> Option<Self>;
}

/// Fixed-size header sent at the start of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader<T: MessageId> {
    /// Application-defined message id
    pub id: T,

    /// Length of the body in bytes. Always equals the actual body length.
    pub body_len: u32,
}

impl<T: MessageId> MessageHeader<T> {
    /// Encode the header into its 8-byte wire form (host byte order)
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];
        raw[..4].copy_from_slice(&self.id.to_u32().to_ne_bytes());
        raw[4..].copy_from_slice(&self.body_len.to_ne_bytes());
        raw
    }

    /// Decode a header from its 8-byte wire form.
    ///
    /// # Errors
    /// Returns `TransportError::UnknownMessageId` if the id value is outside
    /// the application's enumeration.
    pub fn from_bytes(raw: [u8; HEADER_LEN]) -> Result<Self> {
        let raw_id = u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let body_len = u32::from_ne_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let id = T::from_u32(raw_id).ok_or(TransportError::UnknownMessageId(raw_id))?;
        Ok(Self { id, body_len })
    }
}

/// A typed message: header plus body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T: MessageId> {
    /// Header sent ahead of the body
    pub header: MessageHeader<T>,

    /// Raw body bytes, in push order
    pub body: Vec<u8>,
}

impl<T: MessageId> Message<T> {
    /// Create an empty message carrying the given id
    pub fn new(id: T) -> Self {
        Self {
            header: MessageHeader { id, body_len: 0 },
            body: Vec::new(),
        }
    }

    /// Size of the whole message on the wire, header included
    pub fn size(&self) -> usize {
        HEADER_LEN + self.body.len()
    }

    /// Append a value to the end of the body.
    ///
    /// Returns `&mut Self` so pushes can be chained:
    /// `msg.push(pos).push(velocity);`
    pub fn push<V: Pod>(&mut self, value: V) -> &mut Self {
        self.body.extend_from_slice(bytemuck::bytes_of(&value));
        self.header.body_len = self.body.len() as u32;
        self
    }

    /// Remove the most recently pushed value from the end of the body.
    ///
    /// Pops mirror pushes: fields must be popped in the reverse of the order
    /// they were pushed. Popping a differently-typed value of the same size
    /// reinterprets the bytes without complaint.
    ///
    /// # Panics
    /// Panics if the body holds fewer bytes than `V` occupies.
    pub fn pop<V: Pod>(&mut self) -> V {
        let len = std::mem::size_of::<V>();
        assert!(
            self.body.len() >= len,
            "popped {} bytes from a {}-byte message body",
            len,
            self.body.len()
        );
        let at = self.body.len() - len;
        let mut value = V::zeroed();
        bytemuck::bytes_of_mut(&mut value).copy_from_slice(&self.body[at..]);
        self.body.truncate(at);
        self.header.body_len = self.body.len() as u32;
        value
    }
}

impl<T: MessageId> fmt::Display for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{:?} size:{}", self.header.id, self.header.body_len)
    }
}
