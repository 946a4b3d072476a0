/*!
 * Transport Provider
 *
 * The asynchronous, notification-driven endpoint model the socket layer is
 * adapted onto. Endpoints are referenced by handle; every call returns
 * immediately and completion is reported through the endpoint's notifier.
 */

use super::errmap::status_name;
use super::notifier::Notifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Transport status code
///
/// Zero is success. Values in `-3150..=-3204` are transport-level failures;
/// values in `-3290..=-3200` carry a POSIX error through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OtStatus(pub i32);

impl OtStatus {
    pub const NO_ERROR: OtStatus = OtStatus(0);

    pub const BAD_ADDRESS: OtStatus = OtStatus(-3150);
    pub const BAD_OPTION: OtStatus = OtStatus(-3151);
    pub const ACCESS: OtStatus = OtStatus(-3152);
    pub const BAD_REFERENCE: OtStatus = OtStatus(-3153);
    pub const NO_ADDRESS: OtStatus = OtStatus(-3154);
    pub const OUT_STATE: OtStatus = OtStatus(-3155);
    pub const BAD_SEQUENCE: OtStatus = OtStatus(-3156);
    pub const SYS_ERROR: OtStatus = OtStatus(-3157);
    pub const LOOK: OtStatus = OtStatus(-3158);
    pub const BAD_DATA: OtStatus = OtStatus(-3159);
    pub const BUFFER_OVERFLOW: OtStatus = OtStatus(-3160);
    pub const FLOW: OtStatus = OtStatus(-3161);
    pub const NOT_SUPPORTED: OtStatus = OtStatus(-3162);
    pub const STATE_CHANGE: OtStatus = OtStatus(-3163);
    pub const NO_DATA: OtStatus = OtStatus(-3164);
    pub const NO_DISCONNECT: OtStatus = OtStatus(-3165);
    pub const NO_UNITDATA: OtStatus = OtStatus(-3167);
    pub const BAD_FLAG: OtStatus = OtStatus(-3168);
    pub const NO_RELEASE: OtStatus = OtStatus(-3169);
    pub const NO_STRUCTURE_TYPE: OtStatus = OtStatus(-3171);
    pub const BAD_NAME: OtStatus = OtStatus(-3172);
    pub const BAD_QLEN: OtStatus = OtStatus(-3173);
    pub const ADDRESS_BUSY: OtStatus = OtStatus(-3174);
    pub const IND_OUT: OtStatus = OtStatus(-3175);
    pub const PROVIDER_MISMATCH: OtStatus = OtStatus(-3176);
    pub const RES_QLEN: OtStatus = OtStatus(-3177);
    pub const RES_ADDRESS: OtStatus = OtStatus(-3178);
    pub const QFULL: OtStatus = OtStatus(-3179);
    pub const PROTOCOL: OtStatus = OtStatus(-3180);
    pub const BAD_SYNC: OtStatus = OtStatus(-3203);
    pub const CANCELED: OtStatus = OtStatus(-3204);

    pub const K_EPERM: OtStatus = OtStatus(-3200);
    pub const K_ENOENT: OtStatus = OtStatus(-3201);
    pub const K_ENXIO: OtStatus = OtStatus(-3205);
    pub const K_EBADF: OtStatus = OtStatus(-3208);
    pub const K_EAGAIN: OtStatus = OtStatus(-3210);
    pub const K_ENOMEM: OtStatus = OtStatus(-3211);
    pub const K_EACCES: OtStatus = OtStatus(-3212);
    pub const K_EFAULT: OtStatus = OtStatus(-3213);
    pub const K_EBUSY: OtStatus = OtStatus(-3215);
    pub const K_EEXIST: OtStatus = OtStatus(-3216);
    pub const K_ENODEV: OtStatus = OtStatus(-3218);
    pub const K_EINVAL: OtStatus = OtStatus(-3221);
    pub const K_ENOTTY: OtStatus = OtStatus(-3224);
    pub const K_EPIPE: OtStatus = OtStatus(-3231);
    pub const K_ERANGE: OtStatus = OtStatus(-3233);
    pub const K_EWOULDBLOCK: OtStatus = OtStatus(-3234);
    pub const K_EDEADLK: OtStatus = OtStatus(-3235);
    pub const K_EALREADY: OtStatus = OtStatus(-3236);
    pub const K_ENOTSOCK: OtStatus = OtStatus(-3237);
    pub const K_EDESTADDRREQ: OtStatus = OtStatus(-3238);
    pub const K_EMSGSIZE: OtStatus = OtStatus(-3239);
    pub const K_EPROTOTYPE: OtStatus = OtStatus(-3240);
    pub const K_ENOPROTOOPT: OtStatus = OtStatus(-3241);
    pub const K_EPROTONOSUPPORT: OtStatus = OtStatus(-3242);
    pub const K_ESOCKTNOSUPPORT: OtStatus = OtStatus(-3243);
    pub const K_EOPNOTSUPP: OtStatus = OtStatus(-3244);
    pub const K_EADDRINUSE: OtStatus = OtStatus(-3247);
    pub const K_EADDRNOTAVAIL: OtStatus = OtStatus(-3248);
    pub const K_ENETDOWN: OtStatus = OtStatus(-3249);
    pub const K_ENETUNREACH: OtStatus = OtStatus(-3250);
    pub const K_ENETRESET: OtStatus = OtStatus(-3251);
    pub const K_ECONNABORTED: OtStatus = OtStatus(-3252);
    pub const K_ECONNRESET: OtStatus = OtStatus(-3253);
    pub const K_ENOBUFS: OtStatus = OtStatus(-3254);
    pub const K_EISCONN: OtStatus = OtStatus(-3255);
    pub const K_ENOTCONN: OtStatus = OtStatus(-3256);
    pub const K_ESHUTDOWN: OtStatus = OtStatus(-3257);
    pub const K_ETIMEDOUT: OtStatus = OtStatus(-3259);
    pub const K_ECONNREFUSED: OtStatus = OtStatus(-3260);
    pub const K_EHOSTDOWN: OtStatus = OtStatus(-3264);
    pub const K_EHOSTUNREACH: OtStatus = OtStatus(-3265);
    pub const K_EINPROGRESS: OtStatus = OtStatus(-3270);
    pub const K_EINTR: OtStatus = OtStatus(-3290);
    pub const K_EIO: OtStatus = OtStatus(-3291);

    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::NO_ERROR
    }
}

impl fmt::Display for OtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match status_name(*self) {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "unknown transport status ({})", self.0),
        }
    }
}

impl std::error::Error for OtStatus {}

pub type OtResult<T> = Result<T, OtStatus>;

/// Endpoint handle issued by a [`TransportProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointRef(pub u64);

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Endpoint protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Connection-oriented byte stream
    Tcp,
    /// Connectionless unit data
    Udp,
}

/// Asynchronous endpoint events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TransportEvent {
    /// Connection indication waiting on a listener
    Listen = 0x0001,
    /// Outgoing connection completed (or failed, see the result)
    Connect = 0x0002,
    Data = 0x0004,
    /// Expedited (out-of-band) data arrived
    ExData = 0x0008,
    /// Abortive disconnect from the peer
    Disconnect = 0x0010,
    /// Orderly release from the peer
    OrdRel = 0x0080,
    /// Flow control lifted
    GoData = 0x0100,
    /// A connection was passed to this endpoint by an accept
    PassCon = 0x0200,
}

impl TransportEvent {
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Connection indication retrieved by [`TransportProvider::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Address of the connecting endpoint
    pub addr: SocketAddrV4,
    /// Identifies the indication to `accept`
    pub sequence: u32,
}

/// Options for [`TransportProvider::rcv`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RcvOptions {
    /// Leave the data queued
    pub peek: bool,
    /// Read the expedited queue instead of the normal one
    pub expedited: bool,
}

/// Asynchronous transport provider
///
/// No call blocks. Operations that cannot complete right away return
/// [`OtStatus::NO_DATA`] or [`OtStatus::FLOW`]; connection progress is
/// reported by events to the endpoint's [`Notifier`].
pub trait TransportProvider: Send + Sync {
    fn open_endpoint(&self, kind: TransportKind) -> OtResult<EndpointRef>;

    /// Route this endpoint's events to `notifier`
    fn install_notifier(&self, ep: EndpointRef, notifier: Notifier) -> OtResult<()>;

    /// Queue events until housekeeping or [`look`](Self::look) delivers them
    fn set_synchronous(&self, ep: EndpointRef) -> OtResult<()>;

    /// Bind to `requested` (wildcard if `None`); `qlen > 0` makes the
    /// endpoint accept connection indications. Returns the bound address.
    fn bind(
        &self,
        ep: EndpointRef,
        requested: Option<SocketAddrV4>,
        qlen: u32,
    ) -> OtResult<SocketAddrV4>;

    /// Change how many connection indications a bound endpoint may queue.
    /// Indications already queued are kept.
    fn set_queue_length(&self, ep: EndpointRef, qlen: u32) -> OtResult<()>;

    /// Retrieve the oldest connection indication
    fn listen(&self, ep: EndpointRef) -> OtResult<Call>;

    /// Complete `call` onto the `resource` endpoint
    fn accept(&self, listener: EndpointRef, resource: EndpointRef, call: &Call) -> OtResult<()>;

    /// Start connecting to `dest`; completion arrives as
    /// [`TransportEvent::Connect`] or [`TransportEvent::Disconnect`]
    fn connect(&self, ep: EndpointRef, dest: SocketAddrV4) -> OtResult<()>;

    /// Collect the outcome of a completed `connect`, returning the peer
    fn rcv_connect(&self, ep: EndpointRef) -> OtResult<SocketAddrV4>;

    /// Queue stream data; may accept fewer bytes than offered
    fn snd(&self, ep: EndpointRef, data: &[u8], expedited: bool) -> OtResult<usize>;

    /// Read stream data; `Ok(0)` after the peer's orderly release
    fn rcv(&self, ep: EndpointRef, buf: &mut [u8], options: RcvOptions) -> OtResult<usize>;

    fn snd_udata(&self, ep: EndpointRef, dest: SocketAddrV4, data: &[u8]) -> OtResult<()>;

    /// Read one datagram, truncating it to `buf`; returns length and source
    fn rcv_udata(
        &self,
        ep: EndpointRef,
        buf: &mut [u8],
        peek: bool,
    ) -> OtResult<(usize, SocketAddrV4)>;

    /// Abortive disconnect (also cancels an outgoing connect)
    fn snd_disconnect(&self, ep: EndpointRef) -> OtResult<()>;

    /// Orderly release of the sending direction
    fn snd_orderly_disconnect(&self, ep: EndpointRef) -> OtResult<()>;

    /// Deliver queued events and report the endpoint's current event with
    /// its result
    fn look(&self, ep: EndpointRef) -> OtResult<Option<(TransportEvent, OtStatus)>>;

    fn close(&self, ep: EndpointRef) -> OtResult<()>;

    /// Resolve a host name or dotted-quad string
    fn string_to_address(&self, name: &str) -> OtResult<Ipv4Addr>;

    /// Reverse lookup
    fn address_to_name(&self, addr: Ipv4Addr) -> OtResult<String>;
}
