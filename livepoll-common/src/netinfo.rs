//! Local network address discovery
//!
//! The presenter view shows a QR code pointing audience phones at this
//! server, so it needs an address reachable on the LAN rather than
//! `localhost`.

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::debug;

/// Fallback host when no LAN address can be determined
pub const FALLBACK_HOST: &str = "localhost";

/// Response body of `GET /api/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub ip: String,
    pub port: u16,
    pub url: String,
}

impl ServerInfo {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        let ip = ip.into();
        let url = format!("http://{ip}:{port}");
        Self { ip, port, url }
    }

    /// Info for this host, falling back to `localhost`
    pub fn discover(port: u16) -> Self {
        let ip = local_ipv4()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| FALLBACK_HOST.to_string());
        Self::new(ip, port)
    }
}

/// First non-loopback IPv4 address of this host
///
/// Asks the OS which local address it would route an outbound UDP datagram
/// from. `connect` on a UDP socket sends nothing.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    if let Err(e) = socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)) {
        debug!("No outbound IPv4 route: {}", e);
        return None;
    }

    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
