use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use ezsocket_frame::FrameConfig;
use ezsocket_transport::TcpSocket;
use tracing::info;

use crate::config::{ConnectionConfig, Role};
use crate::connection::Connection;
use crate::error::Result;

/// Listens for and accepts peer connections.
///
/// Binding and accepting are separate steps, so a server can bind early
/// and accept whenever it is ready. Each accepted peer gets its own
/// [`Connection`].
pub struct Listener {
    socket: TcpSocket,
    frame: FrameConfig,
    nodelay: bool,
    accepted: AtomicU64,
}

impl Listener {
    /// Bind to `config.host:config.port`, retrying per `config.retry`.
    ///
    /// The frame configuration is validated before the socket is created.
    pub fn bind(config: &ConnectionConfig) -> Result<Self> {
        config.frame.validate()?;
        let socket =
            TcpSocket::bind_with_retry(&config.host, config.port, config.family, &config.retry)?;
        Ok(Self {
            socket,
            frame: config.frame.clone(),
            nodelay: config.nodelay,
            accepted: AtomicU64::new(0),
        })
    }

    /// Accept the next peer (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, addr) = self.socket.accept()?;
        let count = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        info!(peer = %addr, count, "accepted peer");
        Connection::from_stream_with_nodelay(stream, Role::Server, self.frame.clone(), self.nodelay)
    }

    /// Bound socket address; useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    /// Number of peers accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use ezsocket_frame::{FrameError, MAX_PACKET_SIZE};
    use ezsocket_transport::TransportError;

    use super::*;
    use crate::connector::connect_with_config;
    use crate::error::PeerError;

    #[test]
    fn accept_returns_server_connection() {
        let listener = Listener::bind(&ConnectionConfig::server("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().port();

        let server = thread::spawn(move || {
            let conn = listener.accept().unwrap();
            assert_eq!(conn.role(), Role::Server);
            assert!(conn.is_open());
            assert_eq!(listener.accepted(), 1);
        });

        let client = connect_with_config(&ConnectionConfig::client("127.0.0.1", port)).unwrap();
        assert_eq!(client.role(), Role::Client);
        server.join().unwrap();
    }

    #[test]
    fn accepts_multiple_sequential_connections() {
        let listener = Listener::bind(&ConnectionConfig::server("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().port();

        let server = thread::spawn(move || {
            let mut first = listener.accept().unwrap();
            let mut second = listener.accept().unwrap();
            assert_eq!(first.read_int().unwrap() + second.read_int().unwrap(), 3);
            assert_eq!(listener.accepted(), 2);
        });

        let mut c1 = connect_with_config(&ConnectionConfig::client("127.0.0.1", port)).unwrap();
        let mut c2 = connect_with_config(&ConnectionConfig::client("127.0.0.1", port)).unwrap();
        c1.send_int(1).unwrap();
        c2.send_int(2).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn invalid_frame_config_fails_before_bind() {
        let mut config = ConnectionConfig::server("127.0.0.1", 0);
        config.frame.packet_size = MAX_PACKET_SIZE + 1;
        let err = Listener::bind(&config).err().unwrap();
        assert!(matches!(err, PeerError::Frame(FrameError::Config(_))));
    }

    #[test]
    fn busy_address_fails_fast_by_default() {
        let first = Listener::bind(&ConnectionConfig::server("127.0.0.1", 0)).unwrap();
        let port = first.local_addr().port();
        let err = Listener::bind(&ConnectionConfig::server("127.0.0.1", port))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PeerError::Transport(TransportError::Bind { .. })
        ));
    }
}
