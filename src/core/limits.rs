/*!
 * System Limits and Constants
 *
 * Centralized location for table capacities, tick rates and numeric bands.
 * Organized by subsystem. Values marked [POSIX-COMPAT] mirror classic
 * header values the embedding code may depend on.
 */

// =============================================================================
// SIGNALS
// =============================================================================

/// Number of signal slots; valid signal numbers are `1..NSIG`
/// [POSIX-COMPAT]
pub const NSIG: u32 = 32;

// =============================================================================
// THREADS
// =============================================================================

/// Thread table capacity, slot 0 included (reserved for the main thread)
pub const DEFAULT_MAX_THREADS: usize = 64;

/// Thread-specific data keys
pub const DEFAULT_MAX_KEYS: usize = 64;

/// Result reported for a cancelled thread
/// [POSIX-COMPAT] PTHREAD_CANCELED is `(void *)-1`
pub const PTHREAD_CANCELED: usize = usize::MAX;

// =============================================================================
// SOCKETS
// =============================================================================

/// Socket table capacity
pub const DEFAULT_MAX_SOCKETS: usize = 128;

/// First raw descriptor number handed to sockets.
/// Ordinary file descriptors stay below this band.
pub const SOCKET_FD_BASE: i32 = 1000;

/// Listen backlog used when the caller passes a non-positive value
pub const DEFAULT_LISTEN_BACKLOG: u32 = 5;

/// Bytes a loopback connection buffers before flow control kicks in
pub const LOOPBACK_BUFFER_BYTES: usize = 64 * 1024;

/// First ephemeral port the loopback transport hands out
pub const EPHEMERAL_PORT_START: u16 = 49152;

/// [POSIX-COMPAT] FD_SETSIZE equivalent for raw-number interop
pub const FD_SETSIZE: usize = 256;

// =============================================================================
// TIME
// =============================================================================

/// Host tick rate (TickCount is 60 Hz)
pub const TICKS_PER_SECOND: u64 = 60;

/// Ticks a virtual clock advances per cooperative yield
pub const VIRTUAL_TICKS_PER_YIELD: u64 = 1;

// =============================================================================
// PROCESS IDENTITY
// =============================================================================

/// The single process always reports this PID
pub const SELF_PID: i32 = 1;

/// Exit status base for signal-terminated processes (128 + signo)
pub const SIGNAL_EXIT_BASE: i32 = 128;
