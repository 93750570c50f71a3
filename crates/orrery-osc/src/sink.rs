//! Fire-and-forget UDP message sink
//!
//! Delivery carries no acknowledgement, no retry and no queue; an
//! unconfigured sink silently drops every send. Sends use a nonblocking
//! local socket so a slow network can never stall the tick loop.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use crate::expr::Value;
use crate::wire;

/// Outbound endpoint for dispatched messages
#[derive(Debug)]
pub struct Sink {
    target: Option<(UdpSocket, SocketAddr)>,
}

impl Sink {
    /// A sink that drops every message
    pub fn disabled() -> Self {
        Sink { target: None }
    }

    /// A sink delivering to `addr`. Falls back to a disabled sink when the
    /// local socket cannot be created.
    pub fn connected(addr: SocketAddr) -> Self {
        let wildcard = if addr.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        let bind_addr = SocketAddr::new(wildcard, 0);
        match UdpSocket::bind(bind_addr).and_then(|sock| {
            sock.set_nonblocking(true)?;
            Ok(sock)
        }) {
            Ok(sock) => {
                tracing::debug!("OSC sink delivering to {}", addr);
                Sink {
                    target: Some((sock, addr)),
                }
            }
            Err(e) => {
                tracing::warn!("OSC sink unavailable ({}); dropping messages", e);
                Sink::disabled()
            }
        }
    }

    /// Build from an optional endpoint; `None` configures a no-op sink
    pub fn from_endpoint(endpoint: Option<SocketAddr>) -> Self {
        match endpoint {
            Some(addr) => Sink::connected(addr),
            None => Sink::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Encode and dispatch one message. Failures are logged and dropped.
    pub fn send(&self, path: &[u8], args: &[Value]) {
        let Some((sock, addr)) = &self.target else {
            return;
        };
        match wire::encode(path, args) {
            Ok(pkt) => {
                if let Err(e) = sock.send_to(&pkt, addr) {
                    tracing::debug!("OSC send to {} dropped: {}", addr, e);
                }
            }
            Err(e) => tracing::warn!("OSC encode failed: {}", e),
        }
    }
}
