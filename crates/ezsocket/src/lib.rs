//! Typed-value exchange over TCP.
//!
//! ezsocket moves ints, floats, strings, bools, lists and images between
//! two peers using fixed-width decimal length headers and an optional
//! prefix/suffix envelope. Both peers agree on the order of values; nothing
//! on the wire names a value's kind.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP streams, bind/connect with retry, exact-length I/O
//! - [`frame`]: Envelope, header codec, value text forms, chunked bodies
//! - [`peer`]: Connections, listeners and the exchange loop harness (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use ezsocket_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ezsocket_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use ezsocket_peer::*;
}
