/*!
 * Thread Manager
 *
 * Fixed-capacity thread table over host cooperative contexts. Slot 0 is
 * the main thread and is never freed.
 */

use super::tls::{KeyDestructor, ThreadKey, TlsTable};
use super::types::*;
use crate::core::slot::SlotTable;
use crate::core::types::ThreadValue;
use crate::core::InlineString;
use crate::host::{HostThreadId, Yielder};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Unwind payload carrying a `pthread_exit` value to the trampoline
struct ThreadExit(ThreadValue);

#[derive(Debug)]
struct ThreadEntry {
    host: Option<HostThreadId>,
    name: InlineString,
    detached: bool,
    finished: bool,
    cancel_requested: bool,
    result: ThreadValue,
}

pub struct ThreadManager {
    yielder: Arc<Yielder>,
    table: Mutex<SlotTable<ThreadEntry>>,
    tls: Mutex<TlsTable>,
    main: ThreadId,
}

impl ThreadManager {
    pub fn new(yielder: Arc<Yielder>, max_threads: usize, max_keys: usize) -> Arc<Self> {
        let mut table = SlotTable::with_capacity(max_threads.max(1));
        let main = table
            .insert(ThreadEntry {
                host: Some(yielder.host().current_context()),
                name: "main".into(),
                detached: false,
                finished: false,
                cancel_requested: false,
                result: 0,
            })
            .map(ThreadId::from_handle)
            .unwrap_or_else(|| ThreadId::from_handle(crate::core::SlotHandle::new(0, 0)));

        info!(
            "Thread manager initialized ({} slots, {} keys)",
            max_threads, max_keys
        );
        Arc::new(Self {
            yielder,
            table: Mutex::new(table),
            tls: Mutex::new(TlsTable::new(max_threads.max(1), max_keys)),
            main,
        })
    }

    pub fn yielder(&self) -> &Arc<Yielder> {
        &self.yielder
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main
    }

    /// `pthread_create`
    ///
    /// The new thread first runs when the caller next yields.
    pub fn create<F>(self: &Arc<Self>, attr: &ThreadAttr, body: F) -> ThreadResult<ThreadId>
    where
        F: FnOnce() -> ThreadValue + Send + 'static,
    {
        let detached = attr.detach_state == DetachState::Detached;
        let id = {
            let mut table = self.table.lock();
            let handle = table
                .insert(ThreadEntry {
                    host: None,
                    name: InlineString::new(),
                    detached,
                    finished: false,
                    cancel_requested: false,
                    result: 0,
                })
                .ok_or_else(|| {
                    warn!("Thread table full");
                    ThreadError::ResourceExhausted("thread table full".into())
                })?;
            ThreadId::from_handle(handle)
        };

        let name: InlineString = attr
            .name
            .clone()
            .unwrap_or_else(|| format!("pthread-{}", id.raw()).into());
        let manager = Arc::clone(self);
        let spawned = self.yielder.host().spawn_context(
            name.as_str(),
            attr.stack_size,
            Box::new(move || manager.trampoline(id, body)),
        );

        let ctx = match spawned {
            Ok(ctx) => ctx,
            Err(e) => {
                self.table.lock().remove(id.handle());
                return Err(ThreadError::ResourceExhausted(e.to_string().into()));
            }
        };

        if let Some(entry) = self.table.lock().get_mut(id.handle()) {
            entry.host = Some(ctx);
            entry.name = name;
        }
        info!("Created {} on {} (detached: {})", id, ctx, detached);
        Ok(id)
    }

    /// `pthread_join`: wait for the thread, return its result and free it
    pub fn join(&self, id: ThreadId) -> ThreadResult<ThreadValue> {
        {
            let table = self.table.lock();
            let entry = table.get(id.handle()).ok_or(ThreadError::NoSuchThread(id))?;
            if entry.detached {
                return Err(ThreadError::InvalidArgument(
                    format!("{} is detached", id).into(),
                ));
            }
        }
        if id == self.current() {
            return Err(ThreadError::Deadlock("join on self".into()));
        }

        self.yielder.wait_until(None, || {
            self.table
                .lock()
                .get(id.handle())
                .map_or(true, |entry| entry.finished)
        });

        let result = {
            let mut table = self.table.lock();
            if id == self.main {
                table.get(id.handle()).map(|entry| entry.result)
            } else {
                table.remove(id.handle()).map(|entry| entry.result)
            }
        }
        .ok_or(ThreadError::NoSuchThread(id))?;

        self.tls.lock().clear_slot(id.slot());
        debug!("Joined {} with result {:#x}", id, result);
        Ok(result)
    }

    /// `pthread_detach`: frees the slot now if the thread already finished
    pub fn detach(&self, id: ThreadId) -> ThreadResult<()> {
        let mut table = self.table.lock();
        let entry = table
            .get_mut(id.handle())
            .ok_or(ThreadError::NoSuchThread(id))?;
        entry.detached = true;
        if entry.finished && id != self.main {
            table.remove(id.handle());
            drop(table);
            self.tls.lock().clear_slot(id.slot());
            debug!("Detached finished {}, slot freed", id);
        }
        Ok(())
    }

    /// `pthread_exit`: unwinds to the thread's trampoline with `value`
    ///
    /// On the main thread the unwind propagates to the caller of the main
    /// body, which may catch it with [`ThreadManager::catch_exit`].
    pub fn exit(&self, value: ThreadValue) -> ! {
        debug!("{} exiting with {:#x}", self.current(), value);
        panic::resume_unwind(Box::new(ThreadExit(value)))
    }

    /// Run `f`, turning a `pthread_exit` inside it into `Err(value)`
    pub fn catch_exit<F, R>(f: F) -> Result<R, ThreadValue>
    where
        F: FnOnce() -> R,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(r) => Ok(r),
            Err(payload) => match payload.downcast::<ThreadExit>() {
                Ok(exit) => Err(exit.0),
                Err(other) => panic::resume_unwind(other),
            },
        }
    }

    /// `pthread_self`
    pub fn current(&self) -> ThreadId {
        let ctx = self.yielder.host().current_context();
        self.table
            .lock()
            .iter()
            .find(|(_, entry)| entry.host == Some(ctx))
            .map(|(handle, _)| ThreadId::from_handle(handle))
            .unwrap_or(self.main)
    }

    /// `pthread_equal`
    #[inline]
    pub fn equal(a: ThreadId, b: ThreadId) -> bool {
        a == b
    }

    /// `pthread_yield`
    pub fn yield_now(&self) {
        self.yielder.yield_once();
        self.yielder.pump();
    }

    /// `pthread_cancel`: requests cancellation of `id`
    ///
    /// The target stops at its next cancellation point
    /// ([`test_cancel`](Self::test_cancel)), or before its body if it has not
    /// run yet. Joiners wait until it has actually stopped.
    pub fn cancel(&self, id: ThreadId) -> ThreadResult<()> {
        let mut table = self.table.lock();
        let entry = table
            .get_mut(id.handle())
            .ok_or(ThreadError::NoSuchThread(id))?;
        if !entry.finished {
            entry.cancel_requested = true;
        }
        info!("Cancel requested for {}", id);
        Ok(())
    }

    fn cancel_requested(&self, id: ThreadId) -> bool {
        self.table
            .lock()
            .get(id.handle())
            .map_or(false, |entry| entry.cancel_requested)
    }

    /// `pthread_testcancel`: exits with [`PTHREAD_CANCELED`] if cancelled
    pub fn test_cancel(&self) {
        if self.cancel_requested(self.current()) {
            self.exit(PTHREAD_CANCELED);
        }
    }

    pub fn key_create(&self, destructor: Option<KeyDestructor>) -> ThreadResult<ThreadKey> {
        self.tls.lock().create(destructor)
    }

    pub fn key_delete(&self, key: ThreadKey) -> ThreadResult<()> {
        self.tls.lock().delete(key)
    }

    pub fn get_specific(&self, key: ThreadKey) -> Option<ThreadValue> {
        let slot = self.current().slot();
        self.tls.lock().get(slot, key)
    }

    pub fn set_specific(&self, key: ThreadKey, value: ThreadValue) -> ThreadResult<()> {
        let slot = self.current().slot();
        self.tls.lock().set(slot, key, value)
    }

    pub fn info(&self, id: ThreadId) -> Option<ThreadInfo> {
        self.table.lock().get(id.handle()).map(|entry| ThreadInfo {
            id,
            name: entry.name.clone(),
            detached: entry.detached,
            finished: entry.finished,
            cancel_requested: entry.cancel_requested,
        })
    }

    /// Threads in the table, main included
    pub fn thread_count(&self) -> usize {
        self.table.lock().len()
    }

    fn trampoline<F>(&self, id: ThreadId, body: F)
    where
        F: FnOnce() -> ThreadValue,
    {
        if self.cancel_requested(id) {
            debug!("{} cancelled before it ran", id);
            self.finish(id, PTHREAD_CANCELED);
            return;
        }
        let result = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(value) => value,
            Err(payload) => match payload.downcast::<ThreadExit>() {
                Ok(exit) => exit.0,
                Err(_) => {
                    error!("{} panicked, reporting it as cancelled", id);
                    PTHREAD_CANCELED
                }
            },
        };
        self.finish(id, result);
    }

    fn finish(&self, id: ThreadId, result: ThreadValue) {
        if !self.table.lock().contains(id.handle()) {
            debug!("{} finished after its slot was released", id);
            return;
        }

        // Destructors run without the table lock; they may call back in
        let destructors = self.tls.lock().take_for_exit(id.slot());
        for (destructor, value) in destructors {
            destructor(value);
        }

        let mut table = self.table.lock();
        let Some(entry) = table.get_mut(id.handle()) else {
            return;
        };
        if !entry.finished {
            entry.finished = true;
            entry.result = result;
        }
        if entry.detached {
            table.remove(id.handle());
            debug!("Detached {} finished, slot freed", id);
        } else {
            debug!("{} finished with {:#x}", id, result);
        }
    }
}
