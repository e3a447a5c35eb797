//! # Core Message Model
//!
//! Header/body framing and typed encoding of values into a message body.
//!
//! This module provides the foundation of the wire protocol: a fixed 8-byte
//! header carrying the application-defined message id and the body length,
//! followed by the raw body bytes.
//!
//! ## Wire Format
//! ```text
//! [Id(4)] [BodyLen(4)] [Body(N)]
//! ```
//!
//! Integers are written in host byte order; there is no version field and no
//! per-field framing inside the body.

pub mod message;
