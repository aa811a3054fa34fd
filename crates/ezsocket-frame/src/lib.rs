//! Typed-value framing over a byte stream.
//!
//! Every value travels as fixed-width decimal text wrapped in an
//! envelope (a prefix/suffix marker pair both peers agree on):
//! - Int and float values are a single header field
//! - Strings, bools and lists are a length header plus a text body
//! - Images are a length header plus a compressed body sent in packets
//!
//! Nothing on the wire names the kind of a value; both ends must agree on
//! the order of exchanges.

pub mod chunk;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod image_codec;
pub mod reader;
pub mod value;
pub mod writer;

pub use chunk::{receive_body, send_body};
pub use codec::{
    FrameConfig, DEFAULT_HEADER_WIDTH, DEFAULT_MAX_BODY, DEFAULT_PACKET_DELAY, DEFAULT_PACKET_SIZE,
    MAX_HEADER_WIDTH, MAX_PACKET_SIZE,
};
pub use envelope::Envelope;
pub use error::{FrameError, Result};
pub use image_codec::ImageCodec;
#[cfg(feature = "image")]
pub use image_codec::{JpegCodec, DEFAULT_JPEG_QUALITY};
pub use reader::FrameReader;
pub use value::{Value, ValueKind};
pub use writer::FrameWriter;

#[cfg(feature = "image")]
pub use image;
