/*!
 * Signal Handler
 * Default-action table and handler execution
 */

use super::types::Signal;
use crate::core::limits::SIGNAL_EXIT_BASE;
use crate::host::Host;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What the default disposition of a signal does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultAction {
    Terminate,
    /// Terminate with core dump; the host has no core files
    Core,
    Ignore,
    Stop,
    Continue,
}

/// Result of delivering one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalOutcome {
    Ignored,
    HandlerInvoked,
    /// Process left to the shell with this status
    Terminated(i32),
    Stopped,
    Continued,
}

/// Default action for a signal
pub fn default_action(signal: Signal) -> DefaultAction {
    use Signal::*;
    match signal {
        SIGHUP | SIGINT | SIGKILL | SIGUSR1 | SIGUSR2 | SIGPIPE | SIGALRM | SIGTERM
        | SIGSTKFLT | SIGVTALRM | SIGPROF | SIGIO | SIGPWR => DefaultAction::Terminate,

        SIGQUIT | SIGILL | SIGTRAP | SIGABRT | SIGBUS | SIGFPE | SIGSEGV | SIGXCPU | SIGXFSZ
        | SIGSYS => DefaultAction::Core,

        SIGCHLD | SIGURG | SIGWINCH => DefaultAction::Ignore,

        SIGSTOP | SIGTSTP | SIGTTIN | SIGTTOU => DefaultAction::Stop,

        SIGCONT => DefaultAction::Continue,
    }
}

/// Run the default action of `signal`
///
/// Stop and continue have nothing to act on in a single cooperative
/// process and are no-ops.
pub fn execute_default(host: &dyn Host, signal: Signal) -> SignalOutcome {
    match default_action(signal) {
        DefaultAction::Terminate | DefaultAction::Core => {
            let status = SIGNAL_EXIT_BASE + signal.number();
            warn!("Terminating on {} ({})", signal, signal.description());
            host.exit_to_shell(status);
            SignalOutcome::Terminated(status)
        }
        DefaultAction::Stop => {
            info!("Ignoring stop request {}: cannot stop a cooperative process", signal);
            SignalOutcome::Stopped
        }
        DefaultAction::Continue => {
            debug!("{} has nothing to continue", signal);
            SignalOutcome::Continued
        }
        DefaultAction::Ignore => {
            debug!("Ignoring {} (default)", signal);
            SignalOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CoopHost;

    #[test]
    fn test_default_table_kinds() {
        assert_eq!(default_action(Signal::SIGINT), DefaultAction::Terminate);
        assert_eq!(default_action(Signal::SIGSEGV), DefaultAction::Core);
        assert_eq!(default_action(Signal::SIGWINCH), DefaultAction::Ignore);
        assert_eq!(default_action(Signal::SIGTSTP), DefaultAction::Stop);
        assert_eq!(default_action(Signal::SIGCONT), DefaultAction::Continue);
        assert_eq!(default_action(Signal::SIGSTKFLT), DefaultAction::Terminate);
    }

    #[test]
    fn test_terminate_exits_with_signal_status() {
        let host = CoopHost::simulated();
        assert_eq!(
            execute_default(host.as_ref(), Signal::SIGTERM),
            SignalOutcome::Terminated(143)
        );
        assert_eq!(host.exit_status(), Some(143));
    }

    #[test]
    fn test_stop_is_noop() {
        let host = CoopHost::simulated();
        assert_eq!(execute_default(host.as_ref(), Signal::SIGSTOP), SignalOutcome::Stopped);
        assert_eq!(host.exit_status(), None);
    }
}
