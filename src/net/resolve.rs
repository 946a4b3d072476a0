/*!
 * Address Helpers
 * Dotted-quad conversion and host name lookup through the transport
 */

use super::manager::SocketManager;
use super::types::{SocketError, SocketResult, AF_INET, INADDR_NONE};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::debug;

/// Result of a host lookup (`struct hostent`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnt {
    pub name: String,
    pub aliases: Vec<String>,
    pub addr_type: i32,
    /// Bytes per address
    pub length: usize,
    pub addresses: Vec<Ipv4Addr>,
}

impl HostEnt {
    fn single(name: String, addr: Ipv4Addr) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            addr_type: AF_INET,
            length: 4,
            addresses: vec![addr],
        }
    }
}

/// `inet_addr`: the address in network byte order, or `INADDR_NONE`
pub fn inet_addr(text: &str) -> u32 {
    inet_aton(text).map_or(INADDR_NONE, |addr| u32::from(addr).to_be())
}

/// `inet_aton`: strict dotted-quad parse
pub fn inet_aton(text: &str) -> Option<Ipv4Addr> {
    text.trim().parse().ok()
}

/// `inet_ntoa`
pub fn inet_ntoa(addr: Ipv4Addr) -> String {
    addr.to_string()
}

/// `inet_pton`: `Ok(None)` when `text` is not a valid address
pub fn inet_pton(af: i32, text: &str) -> SocketResult<Option<Ipv4Addr>> {
    if af != AF_INET {
        return Err(SocketError::AddressFamily(af));
    }
    Ok(text.parse().ok())
}

/// `inet_ntop`
pub fn inet_ntop(af: i32, addr: Ipv4Addr) -> SocketResult<String> {
    if af != AF_INET {
        return Err(SocketError::AddressFamily(af));
    }
    Ok(addr.to_string())
}

#[inline]
pub fn htons(v: u16) -> u16 {
    v.to_be()
}

#[inline]
pub fn htonl(v: u32) -> u32 {
    v.to_be()
}

#[inline]
pub fn ntohs(v: u16) -> u16 {
    u16::from_be(v)
}

#[inline]
pub fn ntohl(v: u32) -> u32 {
    u32::from_be(v)
}

impl SocketManager {
    /// Resolve a name (or dotted quad) through the transport
    pub fn gethostbyname(&self, name: &str) -> SocketResult<HostEnt> {
        let addr = self
            .provider()
            .string_to_address(name)
            .map_err(|status| {
                debug!("gethostbyname({}) failed: {}", name, status);
                SocketError::HostNotFound(name.into())
            })?;
        Ok(HostEnt::single(name.to_string(), addr))
    }

    pub fn gethostbyaddr(&self, addr: Ipv4Addr) -> SocketResult<HostEnt> {
        let name = self
            .provider()
            .address_to_name(addr)
            .map_err(|_| SocketError::HostNotFound(addr.to_string().into()))?;
        Ok(HostEnt::single(name, addr))
    }

    /// The configured host name
    pub fn gethostname(&self) -> String {
        self.hostname().as_str().to_string()
    }

    /// Renaming the host is never permitted
    pub fn sethostname(&self, _name: &str) -> SocketResult<()> {
        Err(SocketError::PermissionDenied)
    }
}
