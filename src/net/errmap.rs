/*!
 * Transport Status Mapping
 *
 * Total mapping from transport status codes to POSIX errno. Success codes
 * map to `None`; codes missing from the table map to EIO.
 */

use super::transport::OtStatus;
use crate::core::errno::Errno;

/// `(status, name, errno)`; `None` means the status is not a failure
pub const STATUS_TABLE: &[(OtStatus, &str, Option<Errno>)] = &[
    (OtStatus::NO_ERROR, "NoError", None),
    (OtStatus::BAD_ADDRESS, "BadAddress", Some(Errno::EADDRNOTAVAIL)),
    (OtStatus::BAD_OPTION, "BadOption", Some(Errno::EINVAL)),
    (OtStatus::ACCESS, "Access", Some(Errno::EACCES)),
    (OtStatus::BAD_REFERENCE, "BadReference", Some(Errno::EBADF)),
    (OtStatus::NO_ADDRESS, "NoAddress", Some(Errno::EDESTADDRREQ)),
    (OtStatus::OUT_STATE, "OutState", Some(Errno::EINVAL)),
    (OtStatus::BAD_SEQUENCE, "BadSequence", Some(Errno::EINVAL)),
    (OtStatus::SYS_ERROR, "SysError", Some(Errno::EIO)),
    (OtStatus::LOOK, "Look", Some(Errno::EAGAIN)),
    (OtStatus::BAD_DATA, "BadData", Some(Errno::EMSGSIZE)),
    (OtStatus::BUFFER_OVERFLOW, "BufferOverflow", Some(Errno::ENOBUFS)),
    (OtStatus::FLOW, "Flow", Some(Errno::EAGAIN)),
    (OtStatus::NOT_SUPPORTED, "NotSupported", Some(Errno::EOPNOTSUPP)),
    (OtStatus::STATE_CHANGE, "StateChange", Some(Errno::EINVAL)),
    (OtStatus::NO_DATA, "NoData", Some(Errno::EAGAIN)),
    (OtStatus::NO_DISCONNECT, "NoDisconnect", Some(Errno::ENOTCONN)),
    (OtStatus::NO_UNITDATA, "NoUnitData", None),
    (OtStatus::BAD_FLAG, "BadFlag", Some(Errno::EINVAL)),
    (OtStatus::NO_RELEASE, "NoRelease", Some(Errno::ENOTCONN)),
    (OtStatus::NO_STRUCTURE_TYPE, "NoStructureType", Some(Errno::EINVAL)),
    (OtStatus::BAD_NAME, "BadName", Some(Errno::EINVAL)),
    (OtStatus::BAD_QLEN, "BadQLen", Some(Errno::EINVAL)),
    (OtStatus::ADDRESS_BUSY, "AddressBusy", Some(Errno::EADDRINUSE)),
    (OtStatus::IND_OUT, "IndOut", Some(Errno::EINVAL)),
    (OtStatus::PROVIDER_MISMATCH, "ProviderMismatch", Some(Errno::EAFNOSUPPORT)),
    (OtStatus::RES_QLEN, "ResQLen", Some(Errno::EINVAL)),
    (OtStatus::RES_ADDRESS, "ResAddress", Some(Errno::EADDRNOTAVAIL)),
    (OtStatus::QFULL, "QFull", Some(Errno::ENOBUFS)),
    (OtStatus::PROTOCOL, "Protocol", Some(Errno::EPROTONOSUPPORT)),
    (OtStatus::BAD_SYNC, "BadSync", Some(Errno::EINVAL)),
    (OtStatus::CANCELED, "Canceled", Some(Errno::ECANCELED)),
    (OtStatus::K_EPERM, "EPERM", Some(Errno::EPERM)),
    (OtStatus::K_ENOENT, "ENOENT", Some(Errno::ENOENT)),
    (OtStatus::K_EINTR, "EINTR", Some(Errno::EINTR)),
    (OtStatus::K_EIO, "EIO", Some(Errno::EIO)),
    (OtStatus::K_ENXIO, "ENXIO", Some(Errno::ENXIO)),
    (OtStatus::K_EBADF, "EBADF", Some(Errno::EBADF)),
    (OtStatus::K_EAGAIN, "EAGAIN", Some(Errno::EAGAIN)),
    (OtStatus::K_ENOMEM, "ENOMEM", Some(Errno::ENOMEM)),
    (OtStatus::K_EACCES, "EACCES", Some(Errno::EACCES)),
    (OtStatus::K_EFAULT, "EFAULT", Some(Errno::EFAULT)),
    (OtStatus::K_EBUSY, "EBUSY", Some(Errno::EBUSY)),
    (OtStatus::K_EEXIST, "EEXIST", Some(Errno::EEXIST)),
    (OtStatus::K_ENODEV, "ENODEV", Some(Errno::ENODEV)),
    (OtStatus::K_EINVAL, "EINVAL", Some(Errno::EINVAL)),
    (OtStatus::K_ENOTTY, "ENOTTY", Some(Errno::ENOTTY)),
    (OtStatus::K_EPIPE, "EPIPE", Some(Errno::EPIPE)),
    (OtStatus::K_ERANGE, "ERANGE", Some(Errno::ERANGE)),
    (OtStatus::K_EWOULDBLOCK, "EWOULDBLOCK", Some(Errno::EWOULDBLOCK)),
    (OtStatus::K_EDEADLK, "EDEADLK", Some(Errno::EDEADLK)),
    (OtStatus::K_EALREADY, "EALREADY", Some(Errno::EALREADY)),
    (OtStatus::K_ENOTSOCK, "ENOTSOCK", Some(Errno::ENOTSOCK)),
    (OtStatus::K_EDESTADDRREQ, "EDESTADDRREQ", Some(Errno::EDESTADDRREQ)),
    (OtStatus::K_EMSGSIZE, "EMSGSIZE", Some(Errno::EMSGSIZE)),
    (OtStatus::K_EPROTOTYPE, "EPROTOTYPE", Some(Errno::EPROTOTYPE)),
    (OtStatus::K_ENOPROTOOPT, "ENOPROTOOPT", Some(Errno::ENOPROTOOPT)),
    (OtStatus::K_EPROTONOSUPPORT, "EPROTONOSUPPORT", Some(Errno::EPROTONOSUPPORT)),
    (OtStatus::K_ESOCKTNOSUPPORT, "ESOCKTNOSUPPORT", Some(Errno::ESOCKTNOSUPPORT)),
    (OtStatus::K_EOPNOTSUPP, "EOPNOTSUPP", Some(Errno::EOPNOTSUPP)),
    (OtStatus::K_EADDRINUSE, "EADDRINUSE", Some(Errno::EADDRINUSE)),
    (OtStatus::K_EADDRNOTAVAIL, "EADDRNOTAVAIL", Some(Errno::EADDRNOTAVAIL)),
    (OtStatus::K_ENETDOWN, "ENETDOWN", Some(Errno::ENETDOWN)),
    (OtStatus::K_ENETUNREACH, "ENETUNREACH", Some(Errno::ENETUNREACH)),
    (OtStatus::K_ENETRESET, "ENETRESET", Some(Errno::ENETRESET)),
    (OtStatus::K_ECONNABORTED, "ECONNABORTED", Some(Errno::ECONNABORTED)),
    (OtStatus::K_ECONNRESET, "ECONNRESET", Some(Errno::ECONNRESET)),
    (OtStatus::K_ENOBUFS, "ENOBUFS", Some(Errno::ENOBUFS)),
    (OtStatus::K_EISCONN, "EISCONN", Some(Errno::EISCONN)),
    (OtStatus::K_ENOTCONN, "ENOTCONN", Some(Errno::ENOTCONN)),
    (OtStatus::K_ESHUTDOWN, "ESHUTDOWN", Some(Errno::ESHUTDOWN)),
    (OtStatus::K_ETIMEDOUT, "ETIMEDOUT", Some(Errno::ETIMEDOUT)),
    (OtStatus::K_ECONNREFUSED, "ECONNREFUSED", Some(Errno::ECONNREFUSED)),
    (OtStatus::K_EHOSTDOWN, "EHOSTDOWN", Some(Errno::EHOSTDOWN)),
    (OtStatus::K_EHOSTUNREACH, "EHOSTUNREACH", Some(Errno::EHOSTUNREACH)),
    (OtStatus::K_EINPROGRESS, "EINPROGRESS", Some(Errno::EINPROGRESS)),
];

fn lookup(status: OtStatus) -> Option<&'static (OtStatus, &'static str, Option<Errno>)> {
    STATUS_TABLE.iter().find(|(code, _, _)| *code == status)
}

/// errno for a transport status; `None` for the success codes
pub fn ot_to_errno(status: OtStatus) -> Option<Errno> {
    match lookup(status) {
        Some((_, _, errno)) => *errno,
        None => Some(Errno::EIO),
    }
}

/// Symbolic name of a known status
pub fn status_name(status: OtStatus) -> Option<&'static str> {
    lookup(status).map(|(_, name, _)| *name)
}

impl OtStatus {
    /// Shorthand for [`ot_to_errno`]
    #[inline]
    pub fn to_errno(self) -> Option<Errno> {
        ot_to_errno(self)
    }
}
