use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::retry::RetryPolicy;
use crate::stream::SocketStream;

/// Address family used when resolving a host name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressFamily {
    #[default]
    Ipv4,
    Ipv6,
    /// Accept whatever the resolver returns first.
    Any,
}

impl AddressFamily {
    pub fn matches(self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Ipv4 => addr.is_ipv4(),
            AddressFamily::Ipv6 => addr.is_ipv6(),
            AddressFamily::Any => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "ipv4",
            AddressFamily::Ipv6 => "ipv6",
            AddressFamily::Any => "any",
        }
    }
}

/// Resolve `host:port`, keeping only addresses of `family`.
pub fn resolve(host: &str, port: u16, family: AddressFamily) -> Result<Vec<SocketAddr>> {
    let addr_text = format!("{host}:{port}");
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|err| TransportError::Resolve {
            addr: addr_text.clone(),
            reason: err.to_string(),
        })?
        .filter(|addr| family.matches(addr))
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            addr: addr_text,
            reason: format!("no {} address", family.name()),
        });
    }
    Ok(addrs)
}

/// TCP listening socket.
///
/// Provides bind/accept on the server side and connect on the client side,
/// each with an optional retry policy for busy addresses and refused
/// connections.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen once; fails immediately if the address is busy.
    pub fn bind(host: &str, port: u16, family: AddressFamily) -> Result<Self> {
        Self::bind_with_retry(host, port, family, &RetryPolicy::fail_fast())
    }

    /// Bind and listen, retrying according to `policy`.
    pub fn bind_with_retry(
        host: &str,
        port: u16,
        family: AddressFamily,
        policy: &RetryPolicy,
    ) -> Result<Self> {
        let addrs = resolve(host, port, family)?;
        let addr_text = format!("{host}:{port}");

        let listener = policy.run("bind", |attempt| {
            debug!(addr = %addr_text, attempt, "binding");
            TcpListener::bind(&addrs[..]).map_err(|source| TransportError::Bind {
                addr: addr_text.clone(),
                source,
            })
        })?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(SocketStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(peer = %addr, "accepted connection");
        Ok((SocketStream::from(stream), addr))
    }

    /// Connect once to a listening socket (blocking).
    pub fn connect(host: &str, port: u16, family: AddressFamily) -> Result<SocketStream> {
        Self::connect_with_retry(host, port, family, &RetryPolicy::fail_fast())
    }

    /// Connect, retrying according to `policy`.
    pub fn connect_with_retry(
        host: &str,
        port: u16,
        family: AddressFamily,
        policy: &RetryPolicy,
    ) -> Result<SocketStream> {
        let addrs = resolve(host, port, family)?;
        let addr_text = format!("{host}:{port}");

        let stream = policy.run("connect", |attempt| {
            debug!(addr = %addr_text, attempt, "connecting");
            TcpStream::connect(&addrs[..]).map_err(|source| TransportError::Connect {
                addr: addr_text.clone(),
                source,
            })
        })?;

        info!(addr = %addr_text, "connected to tcp socket");
        Ok(SocketStream::from(stream))
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}
