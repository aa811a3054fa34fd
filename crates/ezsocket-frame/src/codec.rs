use std::time::Duration;

use bytes::{BufMut, BytesMut};

use crate::envelope::Envelope;
use crate::error::{FrameError, Result};

/// Width of the decimal header field: 16 ASCII digits.
pub const DEFAULT_HEADER_WIDTH: usize = 16;

/// Widest header field accepted; an `i64` needs at most 19 digits and a sign.
pub const MAX_HEADER_WIDTH: usize = 20;

/// Default chunked-transport packet size in bytes.
pub const DEFAULT_PACKET_SIZE: usize = 59_625;

/// Hard ceiling on the packet size (64 KiB - 1).
pub const MAX_PACKET_SIZE: usize = 65_535;

/// Default sleep between packets of a chunked body.
pub const DEFAULT_PACKET_DELAY: Duration = Duration::from_micros(50);

/// Default maximum body size accepted from a header: 64 MiB.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024 * 1024;

/// Configuration shared by both ends of a framed stream.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Marker pair around every header and body. Must match the peer.
    pub envelope: Envelope,
    /// Number of characters in an int/float field. Default: 16.
    pub header_width: usize,
    /// Maximum bytes per packet of a chunked body. Default: 59625.
    pub packet_size: usize,
    /// Sleep between packets of a chunked body. Default: 50µs.
    pub packet_delay: Duration,
    /// Largest body length accepted from (or sent in) a header. Default: 64 MiB.
    pub max_body_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            envelope: Envelope::default(),
            header_width: DEFAULT_HEADER_WIDTH,
            packet_size: DEFAULT_PACKET_SIZE,
            packet_delay: DEFAULT_PACKET_DELAY,
            max_body_size: DEFAULT_MAX_BODY,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl FrameConfig {
    /// Reject configurations that could never produce a valid frame.
    pub fn validate(&self) -> Result<()> {
        validate_packet_size(self.packet_size)?;
        if self.header_width == 0 || self.header_width > MAX_HEADER_WIDTH {
            return Err(FrameError::Config(format!(
                "header width {} outside 1..={MAX_HEADER_WIDTH}",
                self.header_width
            )));
        }
        if self.max_body_size == 0 {
            return Err(FrameError::Config(
                "max body size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Wire size of one int/float field including the envelope.
    pub fn header_len(&self) -> usize {
        self.envelope.overhead() + self.header_width
    }
}

pub(crate) fn validate_packet_size(packet_size: usize) -> Result<()> {
    if packet_size == 0 || packet_size > MAX_PACKET_SIZE {
        return Err(FrameError::Config(format!(
            "packet size {packet_size} outside 1..={MAX_PACKET_SIZE}"
        )));
    }
    Ok(())
}

/// Encode an integer as a zero-padded, envelope-wrapped fixed-width field.
///
/// Wire format (default width, empty envelope):
/// ```text
/// ┌──────────┬──────────────────────────┬──────────┐
/// │ prefix   │ 16 ASCII chars           │ suffix   │
/// │          │ "0000000000000512"       │          │
/// └──────────┴──────────────────────────┴──────────┘
/// ```
/// Negative values keep the sign in front of the padding: `-000000000000512`.
pub fn encode_int_field(value: i64, config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    let width = config.header_width;
    let text = format!("{value:0width$}");
    put_field(&text, config, dst)
}

/// Encode a float as an envelope-wrapped fixed-width field.
///
/// Uses the shortest text that parses back to the same `f32`. Fails rather
/// than truncating when that text is wider than the field.
pub fn encode_float_field(value: f32, config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    if !value.is_finite() {
        return Err(FrameError::Encoding(format!(
            "non-finite float {value} has no wire form"
        )));
    }
    let width = config.header_width;
    let text = format!("{value:0width$}");
    put_field(&text, config, dst)
}

fn put_field(text: &str, config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    if text.len() > config.header_width {
        return Err(FrameError::Encoding(format!(
            "'{text}' needs {} characters, header field holds {}",
            text.len(),
            config.header_width
        )));
    }
    let envelope = &config.envelope;
    dst.reserve(config.header_len());
    dst.put_slice(envelope.prefix().as_bytes());
    dst.put_slice(text.as_bytes());
    dst.put_slice(envelope.suffix().as_bytes());
    Ok(())
}

/// Decode a fixed-width integer field (envelope included).
///
/// Accepts the sign on either side of the padding: `-000000000000512`
/// and `000000000000-512` both decode to -512.
pub fn decode_int_field(src: &[u8], config: &FrameConfig) -> Result<i64> {
    let text = field_text(src, config)?;
    strip_padding(text)
        .parse::<i64>()
        .map_err(|err| FrameError::Protocol(format!("malformed integer field '{text}': {err}")))
}

/// Decode a fixed-width float field (envelope included).
pub fn decode_float_field(src: &[u8], config: &FrameConfig) -> Result<f32> {
    let text = field_text(src, config)?;
    strip_padding(text)
        .parse::<f32>()
        .map_err(|err| FrameError::Protocol(format!("malformed float field '{text}': {err}")))
}

/// Drop the zero padding in front of a number, keeping what follows it.
fn strip_padding(text: &str) -> String {
    let rest = text.trim_start_matches('0');
    match rest.chars().next() {
        None => "0".to_string(),
        Some('.') => format!("0{rest}"),
        Some(_) => rest.to_string(),
    }
}

fn field_text<'a>(src: &'a [u8], config: &FrameConfig) -> Result<&'a str> {
    if src.len() != config.header_len() {
        return Err(FrameError::Protocol(format!(
            "header field is {} bytes, expected {}",
            src.len(),
            config.header_len()
        )));
    }
    let inner = config.envelope.unwrap(src)?;
    std::str::from_utf8(inner)
        .map_err(|_| FrameError::Protocol("header field is not ASCII text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_int(value: i64, config: &FrameConfig) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_int_field(value, config, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn int_field_is_zero_padded() {
        let config = FrameConfig::default();
        assert_eq!(encode_int(512, &config), b"0000000000000512");
        assert_eq!(encode_int(0, &config), b"0000000000000000");
        assert_eq!(encode_int(-512, &config), b"-000000000000512");
    }

    #[test]
    fn int_field_round_trip_with_envelope() {
        let config = FrameConfig {
            envelope: Envelope::new("start", "end"),
            ..FrameConfig::default()
        };
        let wire = encode_int(-42, &config);
        assert_eq!(wire.len(), config.header_len());
        assert_eq!(decode_int_field(&wire, &config).unwrap(), -42);
    }

    #[test]
    fn int_field_too_wide_is_encoding_error() {
        let config = FrameConfig::default();
        let mut buf = BytesMut::new();
        let err = encode_int_field(10_i64.pow(16), &config, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Encoding(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn float_field_round_trip() {
        let config = FrameConfig::default();
        for value in [3.14_f32, -0.001, 0.0, 123456.78] {
            let mut buf = BytesMut::new();
            encode_float_field(value, &config, &mut buf).unwrap();
            assert_eq!(buf.len(), DEFAULT_HEADER_WIDTH);
            assert_eq!(decode_float_field(&buf, &config).unwrap(), value);
        }
    }

    #[test]
    fn float_field_rejects_unrepresentable_values() {
        let config = FrameConfig::default();
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_float_field(f32::NAN, &config, &mut buf),
            Err(FrameError::Encoding(_))
        ));
        assert!(matches!(
            encode_float_field(1.0e30, &config, &mut buf),
            Err(FrameError::Encoding(_))
        ));
    }

    #[test]
    fn decodes_fields_from_six_decimal_senders() {
        let config = FrameConfig::default();
        assert_eq!(decode_float_field(b"000000003.140000", &config).unwrap(), 3.14);
        assert_eq!(decode_float_field(b"0000000-3.140000", &config).unwrap(), -3.14);
        assert_eq!(decode_float_field(b"00000000.5000000", &config).unwrap(), 0.5);
        assert_eq!(decode_float_field(b"00000000.0000000", &config).unwrap(), 0.0);
    }

    #[test]
    fn decodes_sign_after_padding() {
        let config = FrameConfig::default();
        assert_eq!(decode_int_field(b"000000000000-512", &config).unwrap(), -512);
        assert_eq!(decode_int_field(b"-000000000000512", &config).unwrap(), -512);
        assert_eq!(decode_int_field(b"0000000000000000", &config).unwrap(), 0);

        let enveloped = FrameConfig {
            envelope: Envelope::new("start", "end"),
            ..FrameConfig::default()
        };
        assert_eq!(
            decode_int_field(b"start000000000000-512end", &enveloped).unwrap(),
            -512
        );
    }

    #[test]
    fn misplaced_sign_is_protocol_error() {
        let config = FrameConfig::default();
        for field in [b"00000000-000-512", b"000000000000000-", b"0000000000--0512"] {
            let err = decode_int_field(field, &config).unwrap_err();
            assert!(matches!(err, FrameError::Protocol(_)));
        }
    }

    #[test]
    fn malformed_int_field_is_protocol_error() {
        let config = FrameConfig::default();
        let err = decode_int_field(b"00000000000abc12", &config).unwrap_err();
        assert!(matches!(err, FrameError::Protocol(_)));
    }

    #[test]
    fn envelope_mismatch_in_header_is_protocol_error() {
        let sender = FrameConfig {
            envelope: Envelope::new("aaaaa", "bbb"),
            ..FrameConfig::default()
        };
        let receiver = FrameConfig {
            envelope: Envelope::new("start", "end"),
            ..FrameConfig::default()
        };
        let wire = encode_int(7, &sender);
        let err = decode_int_field(&wire, &receiver).unwrap_err();
        assert!(matches!(err, FrameError::Protocol(_)));
    }

    #[test]
    fn validate_rejects_bad_packet_size_and_width() {
        let mut config = FrameConfig::default();
        assert!(config.validate().is_ok());

        config.packet_size = MAX_PACKET_SIZE + 1;
        assert!(matches!(config.validate(), Err(FrameError::Config(_))));

        config.packet_size = 0;
        assert!(matches!(config.validate(), Err(FrameError::Config(_))));

        config.packet_size = MAX_PACKET_SIZE;
        config.header_width = MAX_HEADER_WIDTH + 1;
        assert!(matches!(config.validate(), Err(FrameError::Config(_))));
    }

    #[test]
    fn custom_header_width() {
        let config = FrameConfig {
            header_width: 8,
            ..FrameConfig::default()
        };
        assert_eq!(encode_int(77, &config), b"00000077");
        assert_eq!(decode_int_field(b"00000077", &config).unwrap(), 77);
    }
}
