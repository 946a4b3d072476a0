/*!
 * Interrupt-Time Tasks
 *
 * Host timers run at interrupt time and may only touch flag words. A
 * FlagTask is the whole of what they can do: OR bits into an atomic word and
 * clear its armed flag.
 */

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FlagTask {
    word: Arc<AtomicU32>,
    bits: u32,
    armed: Arc<AtomicBool>,
}

impl FlagTask {
    /// Arms `armed` immediately; it is cleared when the task fires
    pub fn new(word: Arc<AtomicU32>, bits: u32, armed: Arc<AtomicBool>) -> Self {
        armed.store(true, Ordering::Release);
        Self { word, bits, armed }
    }

    #[inline]
    pub fn fire(&self) {
        self.word.fetch_or(self.bits, Ordering::AcqRel);
        self.armed.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Drop the armed state without setting any bits
    #[inline]
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_sets_bits_and_disarms() {
        let word = Arc::new(AtomicU32::new(0b0001));
        let armed = Arc::new(AtomicBool::new(false));
        let task = FlagTask::new(word.clone(), 1 << 14, armed.clone());
        assert!(armed.load(Ordering::Acquire));

        task.fire();
        assert_eq!(word.load(Ordering::Acquire), 0b0001 | (1 << 14));
        assert!(!task.is_armed());
    }
}
