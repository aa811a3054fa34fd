use std::io::Read;
use std::time::Duration;

use ezsocket_transport::{read_exact, SocketStream};
use tracing::{debug, warn};

use crate::chunk::receive_body;
use crate::codec::{decode_float_field, decode_int_field, validate_packet_size, FrameConfig};
use crate::error::{FrameError, Result};
use crate::image_codec::ImageCodec;
use crate::value::{parse_bool, parse_float_list, parse_int_list, Value, ValueKind};

/// Reads framed values from any `Read` stream.
///
/// Partial reads are handled internally. The reader must ask for the same
/// kinds, in the same order, that the peer sends.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            config: FrameConfig::default(),
        }
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { inner, config })
    }

    /// Read one fixed-width integer field.
    pub fn read_int(&mut self) -> Result<i32> {
        let raw = self.read_header()?;
        let value = decode_int_field(&raw, &self.config)?;
        i32::try_from(value)
            .map_err(|_| FrameError::Protocol(format!("integer {value} does not fit in 32 bits")))
    }

    /// Read one fixed-width float field.
    pub fn read_float(&mut self) -> Result<f32> {
        let raw = self.read_header()?;
        decode_float_field(&raw, &self.config)
    }

    /// Read a length header followed by that many body bytes, envelope stripped.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        let wrapped = read_exact(&mut self.inner, len)?;
        let body = self.config.envelope.unwrap(&wrapped)?;
        debug!(len, "received string body");
        Ok(body.to_vec())
    }

    /// Read a string value.
    pub fn read_string(&mut self) -> Result<String> {
        let body = self.read_bytes()?;
        String::from_utf8(body)
            .map_err(|err| FrameError::Protocol(format!("string body is not UTF-8: {err}")))
    }

    /// Read a bool.
    ///
    /// Returns `Ok(None)` when the body is neither `true`/`false` nor `1`/`0`.
    /// The body has already been consumed, so the stream stays aligned.
    pub fn read_bool(&mut self) -> Result<Option<bool>> {
        let body = self.read_bytes()?;
        let parsed = parse_bool(&body);
        if parsed.is_none() {
            warn!(body = %String::from_utf8_lossy(&body), "unrecognized bool literal");
        }
        Ok(parsed)
    }

    pub fn read_int_list(&mut self) -> Result<Vec<i32>> {
        let text = self.read_string()?;
        parse_int_list(&text)
    }

    pub fn read_float_list(&mut self) -> Result<Vec<f32>> {
        let text = self.read_string()?;
        parse_float_list(&text)
    }

    /// Receive a chunked image body and decompress it with `codec`.
    pub fn read_image<C: ImageCodec>(&mut self, codec: &C) -> Result<C::Image> {
        let compressed = self.read_image_bytes()?;
        codec.decode(&compressed)
    }

    /// Receive a chunked image body without decompressing it.
    pub fn read_image_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        let wrapped = receive_body(
            &mut self.inner,
            len,
            self.config.packet_size,
            self.config.packet_delay,
        )?;
        let body = self.config.envelope.unwrap(&wrapped)?;
        debug!(len, "received image body");
        Ok(body.to_vec())
    }

    /// Read a value of the given kind.
    ///
    /// A malformed bool literal is a protocol error here.
    pub fn read_value(&mut self, kind: ValueKind) -> Result<Value> {
        let value = match kind {
            ValueKind::Bool => match self.read_bool()? {
                Some(v) => Value::Bool(v),
                None => return Err(FrameError::Protocol("malformed bool literal".to_string())),
            },
            ValueKind::Int => Value::Int(self.read_int()?),
            ValueKind::Float => Value::Float(self.read_float()?),
            ValueKind::Str => Value::Str(self.read_string()?),
            ValueKind::IntList => Value::IntList(self.read_int_list()?),
            ValueKind::FloatList => Value::FloatList(self.read_float_list()?),
            #[cfg(feature = "image")]
            ValueKind::Image => {
                Value::Image(self.read_image(&crate::image_codec::JpegCodec::default())?)
            }
        };
        Ok(value)
    }

    fn read_header(&mut self) -> Result<Vec<u8>> {
        Ok(read_exact(&mut self.inner, self.config.header_len())?)
    }

    fn read_len(&mut self) -> Result<usize> {
        let raw = self.read_header()?;
        let len = decode_int_field(&raw, &self.config)?;
        let len = usize::try_from(len)
            .map_err(|_| FrameError::Protocol(format!("negative body length {len}")))?;
        if len > self.config.max_body_size {
            return Err(FrameError::BodyTooLarge {
                size: len,
                max: self.config.max_body_size,
            });
        }
        Ok(len)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn set_packet_size(&mut self, packet_size: usize) -> Result<()> {
        validate_packet_size(packet_size)?;
        self.config.packet_size = packet_size;
        Ok(())
    }

    pub fn set_packet_delay(&mut self, delay: Duration) {
        self.config.packet_delay = delay;
    }

    /// Update maximum body size for subsequent reads.
    pub fn set_max_body_size(&mut self, max_body_size: usize) {
        self.config.max_body_size = max_body_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<SocketStream> {
    /// Create a frame reader for a TCP stream and apply read timeout from config.
    pub fn with_config_socket(inner: SocketStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Self::with_config(inner, config)
    }
}
