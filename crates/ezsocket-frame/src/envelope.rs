use crate::error::{FrameError, Result};

/// Prefix/suffix marker pair wrapped around every header and body.
///
/// Both ends of a connection must use the same envelope. The default
/// (both markers empty) wraps nothing and accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    prefix: String,
    suffix: String,
}

impl Envelope {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Bytes added to every wrapped body.
    pub fn overhead(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overhead() == 0
    }

    /// `prefix + body + suffix`.
    pub fn wrap(&self, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.overhead() + body.len());
        self.wrap_into(body, &mut out);
        out
    }

    /// Append `prefix + body + suffix` to `dst`.
    pub fn wrap_into(&self, body: &[u8], dst: &mut Vec<u8>) {
        dst.extend_from_slice(self.prefix.as_bytes());
        dst.extend_from_slice(body);
        dst.extend_from_slice(self.suffix.as_bytes());
    }

    /// Strip the markers from a wrapped body.
    ///
    /// The prefix must sit at offset 0 and the suffix must end exactly at the
    /// end of `wrapped`; markers appearing elsewhere in the content are
    /// ignored. Prefix and suffix may not overlap.
    pub fn unwrap<'a>(&self, wrapped: &'a [u8]) -> Result<&'a [u8]> {
        let prefix = self.prefix.as_bytes();
        let suffix = self.suffix.as_bytes();

        if wrapped.len() < prefix.len() + suffix.len() {
            return Err(mismatch("body shorter than envelope"));
        }
        if !wrapped.starts_with(prefix) {
            return Err(mismatch("prefix not found at start of body"));
        }
        if !wrapped.ends_with(suffix) {
            return Err(mismatch("suffix not found at end of body"));
        }

        Ok(&wrapped[prefix.len()..wrapped.len() - suffix.len()])
    }
}

fn mismatch(detail: &str) -> FrameError {
    FrameError::Protocol(format!("envelope mismatch: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_and_unwrap() {
        let envelope = Envelope::new("start", "end");
        let wrapped = envelope.wrap(b"payload");
        assert_eq!(wrapped, b"startpayloadend");
        assert_eq!(envelope.unwrap(&wrapped).unwrap(), b"payload");
    }

    #[test]
    fn empty_envelope_is_transparent() {
        let envelope = Envelope::default();
        assert!(envelope.is_empty());
        assert_eq!(envelope.wrap(b"abc"), b"abc");
        assert_eq!(envelope.unwrap(b"anything").unwrap(), b"anything");
    }

    #[test]
    fn empty_body_round_trips() {
        let envelope = Envelope::new("<", ">");
        assert_eq!(envelope.unwrap(&envelope.wrap(b"")).unwrap(), b"");
    }

    #[test]
    fn missing_prefix_is_protocol_error() {
        let envelope = Envelope::new("start", "end");
        let err = envelope.unwrap(b"xxxxxpayloadend").unwrap_err();
        assert!(matches!(err, FrameError::Protocol(msg) if msg.contains("envelope mismatch")));
    }

    #[test]
    fn missing_suffix_is_protocol_error() {
        let envelope = Envelope::new("start", "end");
        let err = envelope.unwrap(b"startpayloadxxx").unwrap_err();
        assert!(matches!(err, FrameError::Protocol(_)));
    }

    #[test]
    fn suffix_inside_content_is_not_accepted() {
        let envelope = Envelope::new("start", "end");
        assert!(envelope.unwrap(b"startpayloadendX").is_err());
    }

    #[test]
    fn overlapping_markers_are_rejected() {
        let envelope = Envelope::new("ab", "bc");
        assert!(envelope.unwrap(b"abc").is_err());
        assert_eq!(envelope.unwrap(b"abbc").unwrap(), b"");
    }
}
