/*!
 * Core Types
 * Common types used across the emulation layer
 */

/// Process ID type. The host runs a single process.
pub type Pid = i32;

/// User/group ID type
pub type Uid = u32;

/// Host monotonic clock tick (classic 60 Hz tick counter)
pub type Ticks = u64;

/// Opaque thread result / thread-specific value, the width of a pointer
pub type ThreadValue = usize;
