//! Connections and exchange loops for ezsocket.
//!
//! This is the "just works" layer. Bind a [`Listener`] or [`connect`] to
//! get a [`Connection`], send and read typed values on it, and drive
//! repeated exchanges with a [`LoopSession`].

pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod harness;
pub mod listener;
pub mod status;

pub use config::{ConnectionConfig, Role};
pub use connection::{Connection, ConnectionState};
pub use connector::{connect, connect_with_config, open};
pub use error::{PeerError, Result};
pub use harness::{Exchange, LoopReport, LoopSession, LoopState, StopHandle, TerminationPolicy};
pub use listener::Listener;
pub use status::{LoopStatus, STATUS_ACTIVE, STATUS_STOP};
