use std::io::Write;
use std::time::Duration;

use bytes::BytesMut;
use ezsocket_transport::{write_exact, SocketStream};
use tracing::debug;

use crate::chunk::send_body;
use crate::codec::{encode_float_field, encode_int_field, validate_packet_size, FrameConfig};
use crate::error::{FrameError, Result};
use crate::image_codec::ImageCodec;
use crate::value::{bool_text, format_float_list, format_int_list, Value};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes framed values to any `Write` stream.
///
/// Every send either reaches the stream completely or returns an error.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config: FrameConfig::default(),
        }
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        })
    }

    /// Send an integer as a single fixed-width field.
    pub fn send_int(&mut self, value: i32) -> Result<()> {
        self.buf.clear();
        encode_int_field(i64::from(value), &self.config, &mut self.buf)?;
        debug!(value, "sending int");
        self.flush_buf()
    }

    /// Send a float as a single fixed-width field.
    pub fn send_float(&mut self, value: f32) -> Result<()> {
        self.buf.clear();
        encode_float_field(value, &self.config, &mut self.buf)?;
        debug!(value, "sending float");
        self.flush_buf()
    }

    /// Send a string: length header, then the envelope-wrapped text.
    pub fn send_string(&mut self, value: &str) -> Result<()> {
        self.send_bytes(value.as_bytes())
    }

    /// Send raw bytes framed like a string.
    pub fn send_bytes(&mut self, body: &[u8]) -> Result<()> {
        let wrapped_len = self.wrapped_len(body.len())?;

        self.buf.clear();
        encode_int_field(wrapped_len as i64, &self.config, &mut self.buf)?;
        let envelope = &self.config.envelope;
        self.buf.reserve(wrapped_len);
        self.buf.extend_from_slice(envelope.prefix().as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(envelope.suffix().as_bytes());

        debug!(len = wrapped_len, "sending string body");
        self.flush_buf()
    }

    /// Send `"true"` or `"false"`.
    pub fn send_bool(&mut self, value: bool) -> Result<()> {
        self.send_string(bool_text(value))
    }

    /// Send `[a,b,c]` as a string.
    pub fn send_int_list(&mut self, values: &[i32]) -> Result<()> {
        self.send_string(&format_int_list(values))
    }

    /// Send `[a,b,c]` as a string.
    pub fn send_float_list(&mut self, values: &[f32]) -> Result<()> {
        let text = format_float_list(values)?;
        self.send_string(&text)
    }

    /// Compress `image` with `codec` and send it through the chunked transport.
    pub fn send_image<C: ImageCodec>(&mut self, codec: &C, image: &C::Image) -> Result<()> {
        let compressed = codec.encode(image)?;
        debug!(
            format = codec.format_name(),
            size = compressed.len(),
            "compressed image"
        );
        self.send_image_bytes(&compressed)
    }

    /// Send an already-compressed image: length header, then packets.
    pub fn send_image_bytes(&mut self, compressed: &[u8]) -> Result<()> {
        let wrapped_len = self.wrapped_len(compressed.len())?;

        self.buf.clear();
        encode_int_field(wrapped_len as i64, &self.config, &mut self.buf)?;
        self.flush_buf()?;

        let wrapped = self.config.envelope.wrap(compressed);
        let packets = send_body(
            &mut self.inner,
            &wrapped,
            self.config.packet_size,
            self.config.packet_delay,
        )?;
        debug!(len = wrapped_len, packets, "sent image body");
        Ok(())
    }

    /// Send any [`Value`] using the matching typed method.
    pub fn send_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Bool(v) => self.send_bool(*v),
            Value::Int(v) => self.send_int(*v),
            Value::Float(v) => self.send_float(*v),
            Value::Str(v) => self.send_string(v),
            Value::IntList(v) => self.send_int_list(v),
            Value::FloatList(v) => self.send_float_list(v),
            #[cfg(feature = "image")]
            Value::Image(v) => self.send_image(&crate::image_codec::JpegCodec::default(), v),
        }
    }

    fn wrapped_len(&self, body_len: usize) -> Result<usize> {
        let wrapped_len = body_len + self.config.envelope.overhead();
        if wrapped_len > self.config.max_body_size {
            return Err(FrameError::BodyTooLarge {
                size: wrapped_len,
                max: self.config.max_body_size,
            });
        }
        Ok(wrapped_len)
    }

    fn flush_buf(&mut self) -> Result<()> {
        write_exact(&mut self.inner, &self.buf)?;
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the chunked-transport packet size for subsequent sends.
    pub fn set_packet_size(&mut self, packet_size: usize) -> Result<()> {
        validate_packet_size(packet_size)?;
        self.config.packet_size = packet_size;
        Ok(())
    }

    /// Update the sleep between packets for subsequent sends.
    pub fn set_packet_delay(&mut self, delay: Duration) {
        self.config.packet_delay = delay;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<SocketStream> {
    /// Create a frame writer for a TCP stream and apply write timeout from config.
    pub fn with_config_socket(inner: SocketStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Self::with_config(inner, config)
    }
}
