/*!
 * Thread-Specific Data
 *
 * `[thread slot][key] -> value` with a destructor per key. Zero is the null
 * value; destructors only run for non-null values at thread termination.
 */

use super::types::{ThreadError, ThreadResult};
use crate::core::types::ThreadValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Destructor run on a thread's non-null value when the thread terminates
pub type KeyDestructor = Arc<dyn Fn(ThreadValue) + Send + Sync>;

/// `pthread_key_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey(pub usize);

#[derive(Clone)]
struct KeySlot {
    destructor: Option<KeyDestructor>,
}

impl fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySlot")
            .field("destructor", &self.destructor.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct TlsTable {
    keys: Vec<Option<KeySlot>>,
    values: Vec<Vec<ThreadValue>>,
}

impl TlsTable {
    pub fn new(max_threads: usize, max_keys: usize) -> Self {
        Self {
            keys: vec![None; max_keys],
            values: vec![vec![0; max_keys]; max_threads],
        }
    }

    /// Lowest unused key
    pub fn create(&mut self, destructor: Option<KeyDestructor>) -> ThreadResult<ThreadKey> {
        let index = self
            .keys
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| ThreadError::ResourceExhausted("key table full".into()))?;
        self.keys[index] = Some(KeySlot { destructor });
        Ok(ThreadKey(index))
    }

    /// Free a key and clear its values; destructors are not run
    pub fn delete(&mut self, key: ThreadKey) -> ThreadResult<()> {
        self.check(key)?;
        self.keys[key.0] = None;
        for row in &mut self.values {
            row[key.0] = 0;
        }
        Ok(())
    }

    pub fn get(&self, slot: usize, key: ThreadKey) -> Option<ThreadValue> {
        self.check(key).ok()?;
        self.values
            .get(slot)
            .map(|row| row[key.0])
            .filter(|v| *v != 0)
    }

    pub fn set(&mut self, slot: usize, key: ThreadKey, value: ThreadValue) -> ThreadResult<()> {
        self.check(key)?;
        let row = self
            .values
            .get_mut(slot)
            .ok_or_else(|| ThreadError::InvalidArgument("unknown thread slot".into()))?;
        row[key.0] = value;
        Ok(())
    }

    /// Take the slot's values paired with their key destructors
    ///
    /// Every value of the slot is cleared.
    pub fn take_for_exit(&mut self, slot: usize) -> Vec<(KeyDestructor, ThreadValue)> {
        let Some(row) = self.values.get_mut(slot) else {
            return Vec::new();
        };
        let mut pending = Vec::new();
        for (key, value) in row.iter_mut().enumerate() {
            let taken = std::mem::take(value);
            if taken == 0 {
                continue;
            }
            if let Some(Some(KeySlot {
                destructor: Some(destructor),
            })) = self.keys.get(key)
            {
                pending.push((destructor.clone(), taken));
            }
        }
        pending
    }

    pub fn clear_slot(&mut self, slot: usize) {
        if let Some(row) = self.values.get_mut(slot) {
            row.fill(0);
        }
    }

    pub fn keys_in_use(&self) -> usize {
        self.keys.iter().filter(|k| k.is_some()).count()
    }

    fn check(&self, key: ThreadKey) -> ThreadResult<()> {
        match self.keys.get(key.0) {
            Some(Some(_)) => Ok(()),
            _ => Err(ThreadError::InvalidArgument(
                format!("key {}", key.0).into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_values_are_per_slot() {
        let mut tls = TlsTable::new(4, 2);
        let key = tls.create(None).unwrap();
        tls.set(1, key, 11).unwrap();
        tls.set(2, key, 22).unwrap();
        assert_eq!(tls.get(1, key), Some(11));
        assert_eq!(tls.get(2, key), Some(22));
        assert_eq!(tls.get(3, key), None);
    }

    #[test]
    fn test_delete_skips_destructor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut tls = TlsTable::new(2, 2);
        let key = tls
            .create(Some(Arc::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })))
            .unwrap();
        tls.set(0, key, 5).unwrap();

        tls.delete(key).unwrap();
        assert!(tls.take_for_exit(0).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(tls.set(0, key, 1).is_err());
    }

    #[test]
    fn test_key_exhaustion() {
        let mut tls = TlsTable::new(1, 1);
        tls.create(None).unwrap();
        assert!(matches!(
            tls.create(None),
            Err(ThreadError::ResourceExhausted(_))
        ));
    }
}
