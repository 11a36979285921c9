//! Transport connection capability.
use std::net::SocketAddr;

/// Addresses and identity of the underlying connection, populated by the
/// transport.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Peer address, when known.
    pub remote_addr: Option<SocketAddr>,
    /// Local accepting address, when known.
    pub local_addr: Option<SocketAddr>,
    /// Transport-assigned connection identifier.
    pub id: Option<String>,
}

impl ConnectionInfo {
    /// Create [`ConnectionInfo`] with nothing known.
    pub fn new() -> Self {
        Self::default()
    }
}
