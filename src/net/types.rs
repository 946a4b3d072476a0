/*!
 * Socket Types
 * BSD socket constants, descriptors, options and errors
 */

use super::transport::{OtStatus, TransportKind};
use crate::core::errno::Errno;
use crate::core::InlineString;
use crate::core::SlotHandle;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddrV4;
use std::ops::BitOr;
use thiserror::Error;

// [POSIX-COMPAT] BSD socket header values

pub const AF_UNSPEC: i32 = 0;
pub const AF_UNIX: i32 = 1;
pub const AF_INET: i32 = 2;
pub const AF_INET6: i32 = 30;

pub const SOCK_STREAM: i32 = 1;
pub const SOCK_DGRAM: i32 = 2;
pub const SOCK_RAW: i32 = 3;

pub const IPPROTO_IP: i32 = 0;
pub const IPPROTO_TCP: i32 = 6;
pub const IPPROTO_UDP: i32 = 17;

pub const SOL_SOCKET: i32 = 0xFFFF;
pub const SO_DEBUG: i32 = 0x0001;
pub const SO_ACCEPTCONN: i32 = 0x0002;
pub const SO_REUSEADDR: i32 = 0x0004;
pub const SO_KEEPALIVE: i32 = 0x0008;
pub const SO_DONTROUTE: i32 = 0x0010;
pub const SO_BROADCAST: i32 = 0x0020;
pub const SO_LINGER: i32 = 0x0080;
pub const SO_OOBINLINE: i32 = 0x0100;
pub const SO_SNDBUF: i32 = 0x1001;
pub const SO_RCVBUF: i32 = 0x1002;
pub const SO_ERROR: i32 = 0x1007;
pub const SO_TYPE: i32 = 0x1008;

pub const TCP_NODELAY: i32 = 0x01;

pub const SHUT_RD: i32 = 0;
pub const SHUT_WR: i32 = 1;
pub const SHUT_RDWR: i32 = 2;

pub const INADDR_ANY: u32 = 0x0000_0000;
pub const INADDR_BROADCAST: u32 = 0xFFFF_FFFF;
pub const INADDR_LOOPBACK: u32 = 0x7F00_0001;
pub const INADDR_NONE: u32 = 0xFFFF_FFFF;

/// Socket operation result
pub type SocketResult<T> = Result<T, SocketError>;

/// Socket errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SocketError {
    #[error("Bad descriptor: {0}")]
    #[diagnostic(code(socket::bad_descriptor))]
    BadDescriptor(i32),

    #[error("Descriptor {0} is not a socket")]
    #[diagnostic(code(socket::not_socket))]
    NotSocket(i32),

    #[error("Address family {0} not supported")]
    #[diagnostic(code(socket::address_family), help("Only AF_INET (2) is supported."))]
    AddressFamily(i32),

    #[error("Protocol or socket type {0} not supported")]
    #[diagnostic(
        code(socket::protocol),
        help("Use SOCK_STREAM with TCP or SOCK_DGRAM with UDP.")
    )]
    ProtocolNotSupported(i32),

    #[error("Socket table full")]
    #[diagnostic(code(socket::table_full), help("Close unused sockets or raise max_sockets."))]
    TableFull,

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(socket::invalid_argument))]
    InvalidArgument(InlineString),

    #[error("Socket is not connected")]
    #[diagnostic(code(socket::not_connected))]
    NotConnected,

    #[error("Socket is already connected")]
    #[diagnostic(code(socket::already_connected))]
    AlreadyConnected,

    #[error("Destination address required")]
    #[diagnostic(code(socket::destination_required))]
    DestinationRequired,

    #[error("Operation would block")]
    #[diagnostic(code(socket::would_block))]
    WouldBlock,

    #[error("Connection in progress")]
    #[diagnostic(
        code(socket::in_progress),
        help("Wait for writability with select(), then check SO_ERROR.")
    )]
    InProgress,

    #[error("Connection already in progress")]
    #[diagnostic(code(socket::already_in_progress))]
    AlreadyInProgress,

    #[error("Operation not supported: {0}")]
    #[diagnostic(code(socket::not_supported))]
    NotSupported(InlineString),

    #[error("Unsupported option {name:#x} at level {level:#x}")]
    #[diagnostic(code(socket::no_protocol_option))]
    NoProtocolOption { level: i32, name: i32 },

    #[error("Broken pipe")]
    #[diagnostic(code(socket::broken_pipe))]
    BrokenPipe,

    #[error("Host not found: {0}")]
    #[diagnostic(code(socket::host_not_found))]
    HostNotFound(InlineString),

    #[error("Operation not permitted")]
    #[diagnostic(code(socket::permission_denied))]
    PermissionDenied,

    #[error("Transport error: {0}")]
    #[diagnostic(code(socket::transport))]
    Transport(OtStatus),
}

impl SocketError {
    pub fn errno(&self) -> Errno {
        match self {
            SocketError::BadDescriptor(_) => Errno::EBADF,
            SocketError::NotSocket(_) => Errno::ENOTSOCK,
            SocketError::AddressFamily(_) => Errno::EAFNOSUPPORT,
            SocketError::ProtocolNotSupported(_) => Errno::EPROTONOSUPPORT,
            SocketError::TableFull => Errno::EMFILE,
            SocketError::InvalidArgument(_) => Errno::EINVAL,
            SocketError::NotConnected => Errno::ENOTCONN,
            SocketError::AlreadyConnected => Errno::EISCONN,
            SocketError::DestinationRequired => Errno::EDESTADDRREQ,
            SocketError::WouldBlock => Errno::EWOULDBLOCK,
            SocketError::InProgress => Errno::EINPROGRESS,
            SocketError::AlreadyInProgress => Errno::EALREADY,
            SocketError::NotSupported(_) => Errno::EOPNOTSUPP,
            SocketError::NoProtocolOption { .. } => Errno::ENOPROTOOPT,
            SocketError::BrokenPipe => Errno::EPIPE,
            SocketError::HostNotFound(_) => Errno::ENOENT,
            SocketError::PermissionDenied => Errno::EPERM,
            SocketError::Transport(status) => status.to_errno().unwrap_or(Errno::EIO),
        }
    }
}

impl From<OtStatus> for SocketError {
    fn from(status: OtStatus) -> Self {
        SocketError::Transport(status)
    }
}

/// Socket type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketType {
    Stream,
    Datagram,
}

impl SocketType {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            SOCK_STREAM => Some(SocketType::Stream),
            SOCK_DGRAM => Some(SocketType::Datagram),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            SocketType::Stream => SOCK_STREAM,
            SocketType::Datagram => SOCK_DGRAM,
        }
    }

    /// Protocol number used when the caller passes 0
    pub fn default_protocol(self) -> i32 {
        match self {
            SocketType::Stream => IPPROTO_TCP,
            SocketType::Datagram => IPPROTO_UDP,
        }
    }

    pub(crate) fn transport(self) -> TransportKind {
        match self {
            SocketType::Stream => TransportKind::Tcp,
            SocketType::Datagram => TransportKind::Udp,
        }
    }
}

/// `send`/`recv` flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MsgFlags(u32);

impl MsgFlags {
    pub const NONE: MsgFlags = MsgFlags(0);
    /// Expedited data
    pub const OOB: MsgFlags = MsgFlags(0x01);
    /// Read without consuming
    pub const PEEK: MsgFlags = MsgFlags(0x02);
    pub const DONTROUTE: MsgFlags = MsgFlags(0x04);
    /// Non-blocking for this call only
    pub const DONTWAIT: MsgFlags = MsgFlags(0x40);
    /// Report EPIPE without raising SIGPIPE
    pub const NOSIGNAL: MsgFlags = MsgFlags(0x4000);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        MsgFlags(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: MsgFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MsgFlags {
    type Output = MsgFlags;

    fn bitor(self, rhs: MsgFlags) -> MsgFlags {
        MsgFlags(self.0 | rhs.0)
    }
}

/// `shutdown` direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownHow {
    Read,
    Write,
    Both,
}

impl ShutdownHow {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            SHUT_RD => Some(ShutdownHow::Read),
            SHUT_WR => Some(ShutdownHow::Write),
            SHUT_RDWR => Some(ShutdownHow::Both),
            _ => None,
        }
    }
}

/// Socket descriptor
///
/// `raw` is the number in the socket band handed to POSIX callers; the slot
/// handle catches use after close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketFd {
    handle: SlotHandle,
    raw: i32,
}

impl SocketFd {
    pub(crate) fn new(handle: SlotHandle, raw: i32) -> Self {
        Self { handle, raw }
    }

    pub(crate) fn handle(&self) -> SlotHandle {
        self.handle
    }

    #[inline]
    pub fn raw(&self) -> i32 {
        self.raw
    }
}

impl fmt::Display for SocketFd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sock:{}", self.raw)
    }
}

/// Boolean socket options accepted by `setsockopt`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketOptions {
    pub reuse_addr: bool,
    pub keep_alive: bool,
    pub broadcast: bool,
    pub no_delay: bool,
}

/// Snapshot of one socket record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketInfo {
    pub fd: i32,
    pub socket_type: SocketType,
    pub protocol: i32,
    pub bound: bool,
    pub listening: bool,
    pub connected: bool,
    pub nonblocking: bool,
    pub local: Option<SocketAddrV4>,
    pub peer: Option<SocketAddrV4>,
    pub readable: bool,
    pub writable: bool,
    pub has_oob: bool,
    pub options: SocketOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errno() {
        assert_eq!(
            SocketError::from(OtStatus::ADDRESS_BUSY).errno(),
            Errno::EADDRINUSE
        );
        assert_eq!(SocketError::from(OtStatus::NO_UNITDATA).errno(), Errno::EIO);
        assert_eq!(SocketError::WouldBlock.errno(), Errno::EAGAIN);
    }

    #[test]
    fn test_msg_flags() {
        let flags = MsgFlags::PEEK | MsgFlags::DONTWAIT;
        assert!(flags.contains(MsgFlags::PEEK));
        assert!(!flags.contains(MsgFlags::OOB));
        assert_eq!(flags.bits(), 0x42);
    }
}
