/*!
 * POSIX Error Numbers
 * errno values and the process-wide last-error slot
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;

/// POSIX error number
///
/// Numeric values follow the common Linux numbering. `EWOULDBLOCK` is an
/// alias of `EAGAIN`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Errno {
    #[error("Operation not permitted")]
    EPERM = 1,
    #[error("No such file or directory")]
    ENOENT = 2,
    #[error("No such process")]
    ESRCH = 3,
    #[error("Interrupted system call")]
    EINTR = 4,
    #[error("Input/output error")]
    EIO = 5,
    #[error("No such device or address")]
    ENXIO = 6,
    #[error("Bad file descriptor")]
    EBADF = 9,
    #[error("Resource temporarily unavailable")]
    EAGAIN = 11,
    #[error("Cannot allocate memory")]
    ENOMEM = 12,
    #[error("Permission denied")]
    EACCES = 13,
    #[error("Bad address")]
    EFAULT = 14,
    #[error("Device or resource busy")]
    EBUSY = 16,
    #[error("File exists")]
    EEXIST = 17,
    #[error("No such device")]
    ENODEV = 19,
    #[error("Invalid argument")]
    EINVAL = 22,
    #[error("Too many open files")]
    EMFILE = 24,
    #[error("Inappropriate ioctl for device")]
    ENOTTY = 25,
    #[error("Broken pipe")]
    EPIPE = 32,
    #[error("Numerical result out of range")]
    ERANGE = 34,
    #[error("Resource deadlock avoided")]
    EDEADLK = 35,
    #[error("Function not implemented")]
    ENOSYS = 38,
    #[error("Socket operation on non-socket")]
    ENOTSOCK = 88,
    #[error("Destination address required")]
    EDESTADDRREQ = 89,
    #[error("Message too long")]
    EMSGSIZE = 90,
    #[error("Protocol wrong type for socket")]
    EPROTOTYPE = 91,
    #[error("Protocol not available")]
    ENOPROTOOPT = 92,
    #[error("Protocol not supported")]
    EPROTONOSUPPORT = 93,
    #[error("Socket type not supported")]
    ESOCKTNOSUPPORT = 94,
    #[error("Operation not supported")]
    EOPNOTSUPP = 95,
    #[error("Address family not supported by protocol")]
    EAFNOSUPPORT = 97,
    #[error("Address already in use")]
    EADDRINUSE = 98,
    #[error("Cannot assign requested address")]
    EADDRNOTAVAIL = 99,
    #[error("Network is down")]
    ENETDOWN = 100,
    #[error("Network is unreachable")]
    ENETUNREACH = 101,
    #[error("Network dropped connection on reset")]
    ENETRESET = 102,
    #[error("Software caused connection abort")]
    ECONNABORTED = 103,
    #[error("Connection reset by peer")]
    ECONNRESET = 104,
    #[error("No buffer space available")]
    ENOBUFS = 105,
    #[error("Transport endpoint is already connected")]
    EISCONN = 106,
    #[error("Transport endpoint is not connected")]
    ENOTCONN = 107,
    #[error("Cannot send after transport endpoint shutdown")]
    ESHUTDOWN = 108,
    #[error("Connection timed out")]
    ETIMEDOUT = 110,
    #[error("Connection refused")]
    ECONNREFUSED = 111,
    #[error("Host is down")]
    EHOSTDOWN = 112,
    #[error("No route to host")]
    EHOSTUNREACH = 113,
    #[error("Operation already in progress")]
    EALREADY = 114,
    #[error("Operation now in progress")]
    EINPROGRESS = 115,
    #[error("Operation canceled")]
    ECANCELED = 125,
}

impl Errno {
    /// [POSIX-COMPAT] same value as EAGAIN
    pub const EWOULDBLOCK: Errno = Errno::EAGAIN;

    const ALL: [Errno; 48] = [
        Errno::EPERM,
        Errno::ENOENT,
        Errno::ESRCH,
        Errno::EINTR,
        Errno::EIO,
        Errno::ENXIO,
        Errno::EBADF,
        Errno::EAGAIN,
        Errno::ENOMEM,
        Errno::EACCES,
        Errno::EFAULT,
        Errno::EBUSY,
        Errno::EEXIST,
        Errno::ENODEV,
        Errno::EINVAL,
        Errno::EMFILE,
        Errno::ENOTTY,
        Errno::EPIPE,
        Errno::ERANGE,
        Errno::EDEADLK,
        Errno::ENOSYS,
        Errno::ENOTSOCK,
        Errno::EDESTADDRREQ,
        Errno::EMSGSIZE,
        Errno::EPROTOTYPE,
        Errno::ENOPROTOOPT,
        Errno::EPROTONOSUPPORT,
        Errno::ESOCKTNOSUPPORT,
        Errno::EOPNOTSUPP,
        Errno::EAFNOSUPPORT,
        Errno::EADDRINUSE,
        Errno::EADDRNOTAVAIL,
        Errno::ENETDOWN,
        Errno::ENETUNREACH,
        Errno::ENETRESET,
        Errno::ECONNABORTED,
        Errno::ECONNRESET,
        Errno::ENOBUFS,
        Errno::EISCONN,
        Errno::ENOTCONN,
        Errno::ESHUTDOWN,
        Errno::ETIMEDOUT,
        Errno::ECONNREFUSED,
        Errno::EHOSTDOWN,
        Errno::EHOSTUNREACH,
        Errno::EALREADY,
        Errno::EINPROGRESS,
        Errno::ECANCELED,
    ];

    /// Numeric errno value
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Convert from a numeric errno value
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }
}

/// Process-wide last-error slot (`errno`)
///
/// Zero means "no error recorded".
#[derive(Debug, Default)]
pub struct LastError {
    code: AtomicI32,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&self, errno: Errno) {
        self.code.store(errno.code(), Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> Option<Errno> {
        Errno::from_code(self.code.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn clear(&self) {
        self.code.store(0, Ordering::Relaxed);
    }
}
