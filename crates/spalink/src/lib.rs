//! Frame reassembly and diagnostics for spa controller links.
//!
//! spalink turns the raw TCP byte stream of a spa controller into validated
//! message payloads, reporting every malformed or partial frame on the way.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP connection to the controller
//! - [`frame`] — Wire format, checksum and the frame reassembler

/// Re-export transport types.
pub mod transport {
    pub use spalink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use spalink_frame::*;
}
