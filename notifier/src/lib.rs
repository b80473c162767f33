//! Status notifier.
//!
//! Holds at most one connected observer. A new connection replaces the
//! previous one, and publishing with nobody connected is a no-op. The
//! [`server`] module exposes the registry over WebSocket.

pub mod error;
pub mod registry;
pub mod server;

pub use error::NotifierError;
pub use registry::{Envelope, Notifier, ObserverId};
pub use server::NotifierServer;
