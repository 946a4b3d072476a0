/*!
 * Network Module
 * BSD sockets adapted onto an asynchronous, notification-driven transport
 */

pub mod errmap;
pub mod loopback;
mod manager;
pub mod notifier;
mod resolve;
mod select;
pub mod transport;
pub mod types;

pub use errmap::{ot_to_errno, STATUS_TABLE};
pub use loopback::LoopbackTransport;
pub use manager::SocketManager;
pub use notifier::{Notifier, SocketFlags};
pub use resolve::{
    htonl, htons, inet_addr, inet_aton, inet_ntoa, inet_ntop, inet_pton, ntohl, ntohs, HostEnt,
};
pub use select::FdSet;
pub use transport::{
    Call, EndpointRef, OtResult, OtStatus, RcvOptions, TransportEvent, TransportKind,
    TransportProvider,
};
pub use types::*;
