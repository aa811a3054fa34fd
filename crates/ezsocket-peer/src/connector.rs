use ezsocket_transport::TcpSocket;

use crate::config::{ConnectionConfig, Role};
use crate::connection::Connection;
use crate::error::Result;
use crate::listener::Listener;

/// Connect to a listening peer as a client with default settings.
pub fn connect(host: &str, port: u16) -> Result<Connection> {
    connect_with_config(&ConnectionConfig::client(host, port))
}

/// Connect with explicit configuration, retrying per `config.retry`.
pub fn connect_with_config(config: &ConnectionConfig) -> Result<Connection> {
    config.frame.validate()?;
    let stream =
        TcpSocket::connect_with_retry(&config.host, config.port, config.family, &config.retry)?;
    Connection::from_stream_with_nodelay(stream, Role::Client, config.frame.clone(), config.nodelay)
}

/// Open one connection according to `config.role`.
///
/// A server binds, accepts a single peer and drops the listener; a client
/// connects. Use [`Listener`] directly to serve more than one peer.
pub fn open(config: &ConnectionConfig) -> Result<Connection> {
    match config.role {
        Role::Server => Listener::bind(config)?.accept(),
        Role::Client => connect_with_config(config),
    }
}
