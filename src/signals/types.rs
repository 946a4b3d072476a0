/*!
 * Signal Types
 * Signal numbers, signal sets, actions and result types
 */

use crate::core::errno::Errno;
use crate::core::limits::NSIG;
use crate::core::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
pub enum SignalError {
    #[error("Invalid signal: {0}")]
    #[diagnostic(code(signal::invalid), help("Signal numbers run from 1 to 31."))]
    InvalidSignal(i32),

    #[error("Signal {0} cannot be caught or ignored")]
    #[diagnostic(code(signal::uncatchable))]
    Uncatchable(Signal),

    #[error("Invalid sigprocmask operation: {0}")]
    #[diagnostic(code(signal::invalid_how))]
    InvalidHow(i32),

    #[error("No such process: {0}")]
    #[diagnostic(
        code(signal::no_such_process),
        help("Only the calling process (pid 1) and the group pseudo-pids 0 and -1 exist.")
    )]
    NoSuchProcess(Pid),

    #[error("Interrupted by signal")]
    #[diagnostic(code(signal::interrupted))]
    Interrupted,
}

impl SignalError {
    pub fn errno(&self) -> Errno {
        match self {
            SignalError::InvalidSignal(_)
            | SignalError::Uncatchable(_)
            | SignalError::InvalidHow(_) => Errno::EINVAL,
            SignalError::NoSuchProcess(_) => Errno::ESRCH,
            SignalError::Interrupted => Errno::EINTR,
        }
    }
}

/// Signal numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum Signal {
    /// Hangup detected on controlling terminal
    SIGHUP = 1,
    /// Interrupt from keyboard (the host's interrupt key)
    SIGINT = 2,
    /// Quit from keyboard
    SIGQUIT = 3,
    /// Illegal instruction
    SIGILL = 4,
    /// Trace/breakpoint trap
    SIGTRAP = 5,
    /// Abort signal
    SIGABRT = 6,
    /// Bus error
    SIGBUS = 7,
    /// Floating-point exception
    SIGFPE = 8,
    /// Kill signal (cannot be caught or blocked)
    SIGKILL = 9,
    SIGUSR1 = 10,
    /// Invalid memory reference
    SIGSEGV = 11,
    SIGUSR2 = 12,
    /// Write to a connection with no reader
    SIGPIPE = 13,
    /// Alarm timer expired
    SIGALRM = 14,
    SIGTERM = 15,
    /// Stack fault
    SIGSTKFLT = 16,
    SIGCHLD = 17,
    SIGCONT = 18,
    /// Stop process (cannot be caught or blocked)
    SIGSTOP = 19,
    SIGTSTP = 20,
    SIGTTIN = 21,
    SIGTTOU = 22,
    /// Urgent condition on socket
    SIGURG = 23,
    SIGXCPU = 24,
    SIGXFSZ = 25,
    SIGVTALRM = 26,
    SIGPROF = 27,
    SIGWINCH = 28,
    SIGIO = 29,
    SIGPWR = 30,
    SIGSYS = 31,
}

impl Signal {
    /// Every signal, in ascending number order
    pub const ALL: [Signal; 31] = [
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGILL,
        Signal::SIGTRAP,
        Signal::SIGABRT,
        Signal::SIGBUS,
        Signal::SIGFPE,
        Signal::SIGKILL,
        Signal::SIGUSR1,
        Signal::SIGSEGV,
        Signal::SIGUSR2,
        Signal::SIGPIPE,
        Signal::SIGALRM,
        Signal::SIGTERM,
        Signal::SIGSTKFLT,
        Signal::SIGCHLD,
        Signal::SIGCONT,
        Signal::SIGSTOP,
        Signal::SIGTSTP,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
        Signal::SIGURG,
        Signal::SIGXCPU,
        Signal::SIGXFSZ,
        Signal::SIGVTALRM,
        Signal::SIGPROF,
        Signal::SIGWINCH,
        Signal::SIGIO,
        Signal::SIGPWR,
        Signal::SIGSYS,
    ];

    /// Convert from signal number
    pub fn from_number(n: i32) -> SignalResult<Self> {
        if n < 1 || n >= NSIG as i32 {
            return Err(SignalError::InvalidSignal(n));
        }
        Ok(Self::ALL[(n - 1) as usize])
    }

    /// Get signal number
    #[inline]
    pub fn number(&self) -> i32 {
        *self as i32
    }

    /// KILL and STOP can never be caught, ignored or blocked
    #[inline]
    pub fn can_catch(&self) -> bool {
        !matches!(self, Signal::SIGKILL | Signal::SIGSTOP)
    }

    #[inline]
    pub(crate) fn bit(&self) -> u32 {
        1u32 << self.number()
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Signal::SIGHUP => "Hangup",
            Signal::SIGINT => "Interrupt",
            Signal::SIGQUIT => "Quit",
            Signal::SIGILL => "Illegal instruction",
            Signal::SIGTRAP => "Trace/breakpoint trap",
            Signal::SIGABRT => "Aborted",
            Signal::SIGBUS => "Bus error",
            Signal::SIGFPE => "Floating point exception",
            Signal::SIGKILL => "Killed",
            Signal::SIGUSR1 => "User defined signal 1",
            Signal::SIGSEGV => "Segmentation fault",
            Signal::SIGUSR2 => "User defined signal 2",
            Signal::SIGPIPE => "Broken pipe",
            Signal::SIGALRM => "Alarm clock",
            Signal::SIGTERM => "Terminated",
            Signal::SIGSTKFLT => "Stack fault",
            Signal::SIGCHLD => "Child status changed",
            Signal::SIGCONT => "Continued",
            Signal::SIGSTOP => "Stopped (signal)",
            Signal::SIGTSTP => "Stopped",
            Signal::SIGTTIN => "Stopped (tty input)",
            Signal::SIGTTOU => "Stopped (tty output)",
            Signal::SIGURG => "Urgent I/O condition",
            Signal::SIGXCPU => "CPU time limit exceeded",
            Signal::SIGXFSZ => "File size limit exceeded",
            Signal::SIGVTALRM => "Virtual timer expired",
            Signal::SIGPROF => "Profiling timer expired",
            Signal::SIGWINCH => "Window size changed",
            Signal::SIGIO => "I/O possible",
            Signal::SIGPWR => "Power failure",
            Signal::SIGSYS => "Bad system call",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.number())
    }
}

/// Set of signals, one bit per signal number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigSet(u32);

impl SigSet {
    /// Bits that correspond to real signals
    const VALID: u32 = !1u32;

    #[inline]
    pub const fn empty() -> Self {
        SigSet(0)
    }

    #[inline]
    pub const fn full() -> Self {
        SigSet(Self::VALID)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        SigSet(bits & Self::VALID)
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn add(&mut self, signum: i32) -> SignalResult<()> {
        let sig = Signal::from_number(signum)?;
        self.0 |= sig.bit();
        Ok(())
    }

    pub fn del(&mut self, signum: i32) -> SignalResult<()> {
        let sig = Signal::from_number(signum)?;
        self.0 &= !sig.bit();
        Ok(())
    }

    pub fn is_member(&self, signum: i32) -> SignalResult<bool> {
        let sig = Signal::from_number(signum)?;
        Ok(self.contains(sig))
    }

    #[inline]
    pub fn contains(&self, sig: Signal) -> bool {
        self.0 & sig.bit() != 0
    }

    /// Builder-style add for a known-valid signal
    #[must_use]
    pub fn with(self, sig: Signal) -> Self {
        SigSet(self.0 | sig.bit())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        Signal::ALL.iter().copied().filter(|s| self.contains(*s))
    }

    /// Same set without KILL and STOP
    #[must_use]
    pub fn catchable(self) -> Self {
        SigSet(self.0 & !(Signal::SIGKILL.bit() | Signal::SIGSTOP.bit()))
    }
}

impl FromIterator<Signal> for SigSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        iter.into_iter().fold(SigSet::empty(), SigSet::with)
    }
}

/// `sigprocmask` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum SigHow {
    Block = 0,
    Unblock = 1,
    SetMask = 2,
}

impl SigHow {
    pub fn from_raw(how: i32) -> SignalResult<Self> {
        match how {
            0 => Ok(SigHow::Block),
            1 => Ok(SigHow::Unblock),
            2 => Ok(SigHow::SetMask),
            other => Err(SignalError::InvalidHow(other)),
        }
    }
}

/// `sa_flags` bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaFlags(u32);

impl SaFlags {
    pub const NOCLDSTOP: SaFlags = SaFlags(0x0001);
    pub const NOCLDWAIT: SaFlags = SaFlags(0x0002);
    pub const SIGINFO: SaFlags = SaFlags(0x0004);
    pub const ONSTACK: SaFlags = SaFlags(0x0008);
    pub const RESTART: SaFlags = SaFlags(0x0010);
    /// Do not block the signal while its handler runs
    pub const NODEFER: SaFlags = SaFlags(0x0040);
    /// Reset to the default action after one delivery
    pub const RESETHAND: SaFlags = SaFlags(0x0080);

    #[inline]
    pub const fn empty() -> Self {
        SaFlags(0)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        SaFlags(bits)
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, other: SaFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SaFlags {
    type Output = SaFlags;

    fn bitor(self, rhs: SaFlags) -> SaFlags {
        SaFlags(self.0 | rhs.0)
    }
}

/// User signal handler
pub type HandlerFn = Arc<dyn Fn(Signal) + Send + Sync>;

/// Signal disposition
#[derive(Clone, Default)]
pub enum SigHandler {
    /// Default action from the default-action table
    #[default]
    Default,
    Ignore,
    Handler(HandlerFn),
}

impl SigHandler {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        SigHandler::Handler(Arc::new(f))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, SigHandler::Default)
    }
}

impl PartialEq for SigHandler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SigHandler::Default, SigHandler::Default) => true,
            (SigHandler::Ignore, SigHandler::Ignore) => true,
            (SigHandler::Handler(a), SigHandler::Handler(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for SigHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigHandler::Default => f.write_str("SIG_DFL"),
            SigHandler::Ignore => f.write_str("SIG_IGN"),
            SigHandler::Handler(h) => write!(f, "Handler({:p})", Arc::as_ptr(h)),
        }
    }
}

/// `struct sigaction`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SigAction {
    pub handler: SigHandler,
    /// Extra signals blocked while the handler runs
    pub mask: SigSet,
    pub flags: SaFlags,
}

impl SigAction {
    pub fn new(handler: SigHandler) -> Self {
        Self {
            handler,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mask(mut self, mask: SigSet) -> Self {
        self.mask = mask;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SaFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Signal statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStats {
    pub signals_raised: u64,
    pub signals_delivered: u64,
    pub handlers_invoked: u64,
    pub signals_ignored: u64,
    pub terminations: u64,
    pub alarms_armed: u64,
    pub interrupt_keys: u64,
    pub pending: SigSet,
    pub blocked: SigSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round_trip() {
        for sig in Signal::ALL {
            assert_eq!(Signal::from_number(sig.number()), Ok(sig));
        }
        assert!(Signal::from_number(0).is_err());
        assert!(Signal::from_number(32).is_err());
        assert_eq!(Signal::SIGSTKFLT.number(), 16);
    }

    #[test]
    fn test_sigset_operations() {
        let mut set = SigSet::empty();
        set.add(2).unwrap();
        set.add(14).unwrap();
        assert!(set.is_member(2).unwrap());
        assert!(!set.is_member(3).unwrap());
        assert_eq!(set.add(0), Err(SignalError::InvalidSignal(0)));
        assert_eq!(set.del(NSIG as i32), Err(SignalError::InvalidSignal(32)));

        set.del(2).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Signal::SIGALRM]);
        assert_eq!(SigSet::full().len(), 31);
    }

    #[test]
    fn test_catchable_strips_kill_and_stop() {
        let set = SigSet::full().catchable();
        assert!(!set.contains(Signal::SIGKILL));
        assert!(!set.contains(Signal::SIGSTOP));
        assert!(set.contains(Signal::SIGTSTP));
    }
}
