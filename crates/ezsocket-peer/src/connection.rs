use std::net::SocketAddr;
use std::time::Duration;

use ezsocket_frame::{
    FrameConfig, FrameError, FrameReader, FrameWriter, ImageCodec, Value, ValueKind,
};
use ezsocket_transport::SocketStream;
use tracing::{debug, info, warn};

use crate::config::Role;
use crate::error::{PeerError, Result};
use crate::status::LoopStatus;

/// Lifecycle of a [`Connection`].
///
/// Connecting happens inside [`Listener::accept`](crate::Listener::accept)
/// and [`connect`](crate::connect); a `Connection` only exists once open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    /// Disconnected locally or after a fatal I/O error. Terminal.
    Closed,
}

/// One end of an established session.
///
/// All reads and writes are blocking and strictly sequential. A transport
/// failure closes the connection; every later call returns
/// [`PeerError::NotConnected`].
pub struct Connection {
    role: Role,
    state: ConnectionState,
    peer_addr: Option<SocketAddr>,
    reader: FrameReader<SocketStream>,
    writer: FrameWriter<SocketStream>,
}

impl Connection {
    /// Wrap a connected stream.
    pub fn from_stream(stream: SocketStream, role: Role, frame: FrameConfig) -> Result<Self> {
        Self::from_stream_with_nodelay(stream, role, frame, true)
    }

    pub(crate) fn from_stream_with_nodelay(
        stream: SocketStream,
        role: Role,
        frame: FrameConfig,
        nodelay: bool,
    ) -> Result<Self> {
        debug!(%role, nodelay, "configuring connection");

        stream.set_nodelay(nodelay)?;
        let peer_addr = stream.peer_addr().ok();
        let reader_stream = stream.try_clone()?;
        let reader = FrameReader::with_config_socket(reader_stream, frame.clone())?;
        let writer = FrameWriter::with_config_socket(stream, frame)?;

        info!(%role, peer = ?peer_addr, "connection open");

        Ok(Self {
            role,
            state: ConnectionState::Open,
            peer_addr,
            reader,
            writer,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn send_int(&mut self, value: i32) -> Result<()> {
        self.with_writer(|w| w.send_int(value))
    }

    pub fn read_int(&mut self) -> Result<i32> {
        self.with_reader(|r| r.read_int())
    }

    pub fn send_float(&mut self, value: f32) -> Result<()> {
        self.with_writer(|w| w.send_float(value))
    }

    pub fn read_float(&mut self) -> Result<f32> {
        self.with_reader(|r| r.read_float())
    }

    pub fn send_string(&mut self, value: &str) -> Result<()> {
        self.with_writer(|w| w.send_string(value))
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.with_reader(|r| r.read_string())
    }

    pub fn send_bool(&mut self, value: bool) -> Result<()> {
        self.with_writer(|w| w.send_bool(value))
    }

    /// `Ok(None)` when the peer sent something other than a bool literal.
    pub fn read_bool(&mut self) -> Result<Option<bool>> {
        self.with_reader(|r| r.read_bool())
    }

    pub fn send_int_list(&mut self, values: &[i32]) -> Result<()> {
        self.with_writer(|w| w.send_int_list(values))
    }

    pub fn read_int_list(&mut self) -> Result<Vec<i32>> {
        self.with_reader(|r| r.read_int_list())
    }

    pub fn send_float_list(&mut self, values: &[f32]) -> Result<()> {
        self.with_writer(|w| w.send_float_list(values))
    }

    pub fn read_float_list(&mut self) -> Result<Vec<f32>> {
        self.with_reader(|r| r.read_float_list())
    }

    pub fn send_image<C: ImageCodec>(&mut self, codec: &C, image: &C::Image) -> Result<()> {
        self.with_writer(|w| w.send_image(codec, image))
    }

    pub fn read_image<C: ImageCodec>(&mut self, codec: &C) -> Result<C::Image> {
        self.with_reader(|r| r.read_image(codec))
    }

    pub fn send_value(&mut self, value: &Value) -> Result<()> {
        self.with_writer(|w| w.send_value(value))
    }

    pub fn read_value(&mut self, kind: ValueKind) -> Result<Value> {
        self.with_reader(|r| r.read_value(kind))
    }

    pub(crate) fn send_status(&mut self, status: LoopStatus) -> Result<()> {
        self.send_string(status.as_str())
    }

    pub(crate) fn read_status(&mut self) -> Result<LoopStatus> {
        let text = self.read_string()?;
        LoopStatus::parse(&text).ok_or(PeerError::UnexpectedStatus(text))
    }

    pub fn packet_size(&self) -> usize {
        self.writer.config().packet_size
    }

    /// Change the packet size used for images in both directions.
    ///
    /// The peer must make the same change before the next image.
    pub fn set_packet_size(&mut self, packet_size: usize) -> Result<()> {
        self.writer.set_packet_size(packet_size)?;
        self.reader.set_packet_size(packet_size)?;
        Ok(())
    }

    pub fn packet_delay(&self) -> Duration {
        self.writer.config().packet_delay
    }

    pub fn set_packet_delay(&mut self, delay: Duration) {
        self.writer.set_packet_delay(delay);
        self.reader.set_packet_delay(delay);
    }

    /// Shut the stream down in both directions. Calling it again is a no-op.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        info!(role = %self.role, peer = ?self.peer_addr, "disconnecting");
        self.writer.get_ref().shutdown()?;
        Ok(())
    }

    fn with_writer<T>(
        &mut self,
        op: impl FnOnce(&mut FrameWriter<SocketStream>) -> ezsocket_frame::Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let result = op(&mut self.writer);
        self.settle(result)
    }

    fn with_reader<T>(
        &mut self,
        op: impl FnOnce(&mut FrameReader<SocketStream>) -> ezsocket_frame::Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let result = op(&mut self.reader);
        self.settle(result)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            ConnectionState::Open => Ok(()),
            _ => Err(PeerError::NotConnected),
        }
    }

    fn settle<T>(&mut self, result: ezsocket_frame::Result<T>) -> Result<T> {
        result.map_err(|err| {
            // Any I/O failure may have consumed part of a frame.
            if let FrameError::Transport(transport) = &err {
                if transport.is_disconnect() {
                    warn!(role = %self.role, error = %err, "connection lost");
                } else {
                    warn!(role = %self.role, error = %err, "i/o failed, closing connection");
                }
                self.state = ConnectionState::Closed;
                let _ = self.writer.get_ref().shutdown();
            }
            err.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpStream;
    use std::thread;

    use ezsocket_frame::image::{DynamicImage, GenericImageView, Rgb, RgbImage};
    use ezsocket_frame::{Envelope, JpegCodec};

    use super::*;
    use crate::config::ConnectionConfig;
    use crate::connector::connect_with_config;
    use crate::listener::Listener;

    fn pair(frame: FrameConfig) -> (Connection, Connection) {
        let listener =
            Listener::bind(&ConnectionConfig::server("127.0.0.1", 0).with_frame_config(frame.clone()))
                .unwrap();
        let port = listener.local_addr().port();
        let client =
            connect_with_config(&ConnectionConfig::client("127.0.0.1", port).with_frame_config(frame))
                .unwrap();
        let server = listener.accept().unwrap();
        (server, client)
    }

    fn enveloped() -> FrameConfig {
        FrameConfig {
            envelope: Envelope::new("start", "end"),
            ..FrameConfig::default()
        }
    }

    #[test]
    fn exchanges_int() {
        let (mut server, mut client) = pair(enveloped());
        assert_eq!(server.role(), Role::Server);
        assert_eq!(client.role(), Role::Client);
        assert_eq!(server.state(), ConnectionState::Open);
        assert_eq!(client.state(), ConnectionState::Open);

        client.send_int(512).unwrap();
        assert_eq!(server.read_int().unwrap(), 512);
    }

    #[test]
    fn exchanges_float_list() {
        let (mut server, mut client) = pair(enveloped());
        client.send_float_list(&[3.14, 3.14, 3.14]).unwrap();
        let got = server.read_float_list().unwrap();
        assert_eq!(got.len(), 3);
        for value in got {
            assert!((value - 3.14).abs() < 1e-5);
        }
    }

    #[test]
    fn exchanges_mixed_values_both_ways() {
        let (mut server, mut client) = pair(enveloped());
        client.send_string("ping").unwrap();
        client.send_bool(true).unwrap();
        client.send_int_list(&[1, 2, 3]).unwrap();
        assert_eq!(server.read_string().unwrap(), "ping");
        assert_eq!(server.read_bool().unwrap(), Some(true));
        assert_eq!(server.read_int_list().unwrap(), vec![1, 2, 3]);

        server.send_float(-2.5).unwrap();
        assert_eq!(client.read_float().unwrap(), -2.5);
    }

    #[test]
    fn bool_soft_failure_keeps_connection_open() {
        let (mut server, mut client) = pair(FrameConfig::default());
        client.send_string("maybe").unwrap();
        assert_eq!(server.read_bool().unwrap(), None);
        assert!(server.is_open());
    }

    #[test]
    fn image_with_small_packets() {
        let (mut server, mut client) = pair(enveloped());
        client.set_packet_size(128).unwrap();
        server.set_packet_size(128).unwrap();
        client.set_packet_delay(Duration::ZERO);
        server.set_packet_delay(Duration::ZERO);
        assert_eq!(client.packet_size(), 128);
        assert_eq!(client.packet_delay(), Duration::ZERO);

        let sender = thread::spawn(move || {
            let img = DynamicImage::ImageRgb8(RgbImage::from_fn(500, 500, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, 200])
            }));
            client.send_image(&JpegCodec::default(), &img).unwrap();
            client
        });

        let img = server.read_image(&JpegCodec::default()).unwrap();
        assert_eq!(img.dimensions(), (500, 500));
        sender.join().unwrap();
    }

    #[test]
    fn rejects_out_of_range_packet_size() {
        let (mut server, _client) = pair(FrameConfig::default());
        let err = server.set_packet_size(65_536).unwrap_err();
        assert!(matches!(err, PeerError::Frame(FrameError::Config(_))));
        assert!(matches!(
            server.set_packet_size(0),
            Err(PeerError::Frame(FrameError::Config(_)))
        ));
        assert_eq!(server.packet_size(), ezsocket_frame::DEFAULT_PACKET_SIZE);
    }

    #[test]
    fn peer_disconnect_closes_connection() {
        let (mut server, mut client) = pair(FrameConfig::default());
        client.disconnect().unwrap();
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(matches!(client.send_int(1), Err(PeerError::NotConnected)));

        let err = server.read_int().unwrap_err();
        assert!(err.is_disconnect());
        assert_eq!(server.state(), ConnectionState::Closed);
        assert!(matches!(server.read_int(), Err(PeerError::NotConnected)));
    }

    #[test]
    fn read_timeout_mid_header_closes_connection() {
        let frame = FrameConfig {
            read_timeout: Some(Duration::from_millis(100)),
            ..FrameConfig::default()
        };
        let listener =
            Listener::bind(&ConnectionConfig::server("127.0.0.1", 0).with_frame_config(frame))
                .unwrap();
        let mut raw = TcpStream::connect(listener.local_addr()).unwrap();
        let mut server = listener.accept().unwrap();

        raw.write_all(b"00000000").unwrap();
        let err = server.read_int().unwrap_err();
        assert!(matches!(err, PeerError::Frame(FrameError::Transport(_))));
        assert!(!err.is_disconnect());
        assert_eq!(server.state(), ConnectionState::Closed);

        let _ = raw.write_all(b"00000512");
        assert!(matches!(server.read_int(), Err(PeerError::NotConnected)));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mut server, _client) = pair(FrameConfig::default());
        server.disconnect().unwrap();
        server.disconnect().unwrap();
        assert!(!server.is_open());
    }

    #[test]
    fn envelope_mismatch_is_not_a_disconnect() {
        let listener = Listener::bind(
            &ConnectionConfig::server("127.0.0.1", 0).with_envelope(Envelope::new("<<", ">>")),
        )
        .unwrap();
        let port = listener.local_addr().port();
        let mut client = connect_with_config(
            &ConnectionConfig::client("127.0.0.1", port).with_envelope(Envelope::new("[[", "]]")),
        )
        .unwrap();
        let mut server = listener.accept().unwrap();

        client.send_int(5).unwrap();
        let err = server.read_int().unwrap_err();
        assert!(matches!(err, PeerError::Frame(FrameError::Protocol(_))));
        assert!(server.is_open());
    }
}
