use std::fmt;

use ezsocket_frame::{Envelope, FrameConfig};
use ezsocket_transport::{AddressFamily, RetryPolicy};

/// Which side of the connection this end plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to open one end of a connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Host to bind (server) or connect to (client).
    pub host: String,
    pub port: u16,
    pub family: AddressFamily,
    pub role: Role,
    /// Framing settings; must match the peer's envelope and header width.
    pub frame: FrameConfig,
    /// Applied to bind on the server and connect on the client.
    pub retry: RetryPolicy,
    /// Set TCP_NODELAY on the connected stream. Default: true.
    pub nodelay: bool,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16, role: Role) -> Self {
        Self {
            host: host.into(),
            port,
            family: AddressFamily::default(),
            role,
            frame: FrameConfig::default(),
            retry: RetryPolicy::fail_fast(),
            nodelay: true,
        }
    }

    pub fn server(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Role::Server)
    }

    pub fn client(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Role::Client)
    }

    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.frame.envelope = envelope;
        self
    }

    pub fn with_frame_config(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// `host:port` for logs and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
