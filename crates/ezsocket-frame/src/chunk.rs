//! Chunked transport for large bodies.
//!
//! A body is moved as consecutive packets of at most `packet_size` bytes,
//! with an optional sleep between packets. Packet boundaries carry no
//! meaning on the wire; the receiver only needs the total length.

use std::io::{Read, Write};
use std::time::Duration;

use ezsocket_transport::{read_exact_into, write_exact, TransportError};
use tracing::debug;

use crate::codec::validate_packet_size;
use crate::error::Result;

/// Send `body` as packets of at most `packet_size` bytes.
///
/// Returns the number of packets written. An empty body writes nothing.
pub fn send_body<W: Write + ?Sized>(
    writer: &mut W,
    body: &[u8],
    packet_size: usize,
    delay: Duration,
) -> Result<usize> {
    validate_packet_size(packet_size)?;

    let mut packets = 0usize;
    for (index, packet) in body.chunks(packet_size).enumerate() {
        if index > 0 {
            pause(delay);
        }
        write_exact(writer, packet)?;
        packets += 1;
        debug!(packet = index, size = packet.len(), total = body.len(), "sent packet");
    }
    Ok(packets)
}

/// Receive exactly `total_len` bytes as packets of at most `packet_size` bytes.
pub fn receive_body<R: Read + ?Sized>(
    reader: &mut R,
    total_len: usize,
    packet_size: usize,
    delay: Duration,
) -> Result<Vec<u8>> {
    validate_packet_size(packet_size)?;

    let mut body = vec![0u8; total_len];
    for (index, packet) in body.chunks_mut(packet_size).enumerate() {
        if index > 0 {
            pause(delay);
        }
        let offset = index * packet_size;
        read_exact_into(reader, packet).map_err(|err| match err {
            TransportError::Closed { transferred, .. } => TransportError::Closed {
                expected: total_len,
                transferred: offset + transferred,
            },
            other => other,
        })?;
        debug!(
            packet = index,
            size = packet.len(),
            accumulated = offset + packet.len(),
            total = total_len,
            "received packet"
        );
    }
    Ok(body)
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::MAX_PACKET_SIZE;
    use crate::error::FrameError;

    /// Records the size of every write call.
    #[derive(Default)]
    struct PacketRecorder {
        writes: Vec<usize>,
        data: Vec<u8>,
    }

    impl Write for PacketRecorder {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes.push(buf.len());
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Returns at most 5 bytes per read call.
    struct TrickleReader {
        inner: Cursor<Vec<u8>>,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(5);
            self.inner.read(&mut buf[..n])
        }
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn reassembles_bodies_around_packet_boundaries() {
        for packet_size in [1, 7, 128, MAX_PACKET_SIZE] {
            for len in [
                0,
                packet_size - 1,
                packet_size,
                packet_size + 1,
                10 * packet_size,
            ] {
                let body = payload(len);
                let mut wire = PacketRecorder::default();
                send_body(&mut wire, &body, packet_size, Duration::ZERO).unwrap();

                let mut reader = Cursor::new(wire.data);
                let got = receive_body(&mut reader, len, packet_size, Duration::ZERO).unwrap();
                assert_eq!(got, body, "packet_size={packet_size} len={len}");
            }
        }
    }

    #[test]
    fn splits_into_bounded_packets() {
        let mut wire = PacketRecorder::default();
        let packets = send_body(&mut wire, &payload(300), 128, Duration::ZERO).unwrap();
        assert_eq!(packets, 3);
        assert_eq!(wire.writes, vec![128, 128, 44]);
    }

    #[test]
    fn empty_body_sends_no_packets() {
        let mut wire = PacketRecorder::default();
        assert_eq!(send_body(&mut wire, b"", 128, Duration::ZERO).unwrap(), 0);
        assert!(wire.writes.is_empty());
    }

    #[test]
    fn receive_tolerates_short_reads() {
        let body = payload(1000);
        let mut reader = TrickleReader {
            inner: Cursor::new(body.clone()),
        };
        let got = receive_body(&mut reader, 1000, 128, Duration::ZERO).unwrap();
        assert_eq!(got, body);
    }

    #[test]
    fn early_close_reports_total_progress() {
        let mut reader = Cursor::new(payload(300));
        let err = receive_body(&mut reader, 500, 128, Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Closed {
                expected: 500,
                transferred: 300
            })
        ));
        assert!(err.is_disconnect());
    }

    #[test]
    fn rejects_out_of_range_packet_size() {
        let mut wire = PacketRecorder::default();
        assert!(matches!(
            send_body(&mut wire, b"abc", 0, Duration::ZERO),
            Err(FrameError::Config(_))
        ));
        assert!(matches!(
            send_body(&mut wire, b"abc", MAX_PACKET_SIZE + 1, Duration::ZERO),
            Err(FrameError::Config(_))
        ));
        let mut reader = Cursor::new(Vec::new());
        assert!(matches!(
            receive_body(&mut reader, 0, MAX_PACKET_SIZE + 1, Duration::ZERO),
            Err(FrameError::Config(_))
        ));
    }
}
