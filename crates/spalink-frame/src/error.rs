use spalink_transport::TransportError;

/// Errors that can occur while encoding frames or reading them off a stream.
///
/// Malformed frames are not errors; they are reported as
/// [`FrameOutcome`](crate::FrameOutcome) values.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 1-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport could not be configured.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// The connection was closed by the controller.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
