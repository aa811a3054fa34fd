//! Blocking TCP transport for ezsocket.
//!
//! This is the lowest layer of ezsocket. It provides:
//! - [`SocketStream`], a connected TCP stream
//! - [`TcpSocket`], bind/accept/connect with an optional [`RetryPolicy`]
//! - [`exact`], read/write helpers that never stop at a short transfer
//!
//! Everything else builds on top of these.

pub mod error;
pub mod exact;
pub mod retry;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use exact::{read_exact, read_exact_into, write_exact};
pub use retry::RetryPolicy;
pub use stream::SocketStream;
pub use tcp::{resolve, AddressFamily, TcpSocket};
