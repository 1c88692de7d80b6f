//! TCP transport for spa controller links.
//!
//! The controller exposes its control protocol on a plain TCP port. This crate
//! only dials and wraps the socket; reconnect policy belongs to the caller.
//! Everything above it reads raw chunks from the [`SpaStream`] provided here.

pub mod error;
pub mod stream;

pub use error::{Result, TransportError};
pub use stream::{SpaStream, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
