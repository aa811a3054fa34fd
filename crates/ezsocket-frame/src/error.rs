use ezsocket_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame configuration is invalid (packet size, header width).
    #[error("invalid frame configuration: {0}")]
    Config(String),

    /// A value cannot be represented in the wire format.
    #[error("cannot encode value: {0}")]
    Encoding(String),

    /// The received bytes do not follow the wire format.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Image compression or decompression failed.
    #[error("image codec error: {0}")]
    Codec(String),

    /// The announced body exceeds the configured maximum size.
    #[error("frame body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The underlying stream failed or closed mid-frame.
    #[error("frame I/O error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Returns true if the stream is gone and the session cannot continue.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, FrameError::Transport(err) if err.is_disconnect())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
