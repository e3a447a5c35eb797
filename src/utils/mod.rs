//! # Utility Modules
//!
//! Supporting utilities shared by both endpoint roles.
//!
//! ## Components
//! - **Queue**: Mutex-guarded double-ended queue with a blocking wait,
//!   used to hand inbound messages from the I/O thread to the application
//! - **Logging**: Structured logging configuration

pub mod logging;
pub mod queue;

pub use queue::ConcurrentQueue;
