/// Errors that can occur in connection and loop operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error (bind, connect, accept, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] ezsocket_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] ezsocket_frame::FrameError),

    /// The connection was closed, locally or by a fatal I/O error.
    #[error("connection is not open")]
    NotConnected,

    /// The peer sent a loop status that is neither "Active" nor "Stop".
    #[error("unexpected loop status '{0}'")]
    UnexpectedStatus(String),
}

impl PeerError {
    /// Returns true if the session cannot continue on this connection.
    pub fn is_disconnect(&self) -> bool {
        match self {
            PeerError::NotConnected => true,
            PeerError::Transport(err) => err.is_disconnect(),
            PeerError::Frame(err) => err.is_disconnect(),
            PeerError::UnexpectedStatus(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;
