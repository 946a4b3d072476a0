/*!
 * Cooperative Scheduler
 *
 * Single-baton executor. Every cooperative context is backed by an OS
 * thread, but only the context holding the baton runs; the others are
 * parked on a condition variable. Yielding passes the baton to the head of
 * a FIFO ready queue and appends the caller to its tail.
 */

use super::traits::{ContextBody, HostError, HostResult, HostThreadId};
use ahash::RandomState;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error, info};

/// Smallest stack the host will hand a context
const MIN_STACK_SIZE: usize = 64 * 1024;

struct BatonState {
    current: Option<HostThreadId>,
    ready: VecDeque<HostThreadId>,
    contexts: HashMap<ThreadId, HostThreadId, RandomState>,
    next_id: u64,
    live: usize,
    switches: u64,
}

pub struct CooperativeScheduler {
    state: Mutex<BatonState>,
    baton: Condvar,
}

impl CooperativeScheduler {
    /// Create a scheduler whose main context is the calling OS thread
    pub fn new() -> Arc<Self> {
        let mut contexts = HashMap::with_hasher(RandomState::new());
        contexts.insert(thread::current().id(), HostThreadId::MAIN);
        info!("Cooperative scheduler initialized");
        Arc::new(Self {
            state: Mutex::new(BatonState {
                current: Some(HostThreadId::MAIN),
                ready: VecDeque::new(),
                contexts,
                next_id: 1,
                live: 1,
                switches: 0,
            }),
            baton: Condvar::new(),
        })
    }

    /// Context of the calling OS thread, if it belongs to this scheduler
    pub fn current(&self) -> Option<HostThreadId> {
        self.state.lock().contexts.get(&thread::current().id()).copied()
    }

    /// Pass the baton to the next ready context and wait for it to come back
    ///
    /// Returns immediately when nothing else is ready.
    pub fn yield_now(&self) {
        let mut state = self.state.lock();
        let me = match state.contexts.get(&thread::current().id()).copied() {
            Some(me) if state.current == Some(me) => me,
            _ => {
                drop(state);
                thread::yield_now();
                return;
            }
        };

        let Some(next) = state.ready.pop_front() else {
            return;
        };
        state.ready.push_back(me);
        state.current = Some(next);
        state.switches += 1;
        self.baton.notify_all();

        while state.current != Some(me) {
            self.baton.wait(&mut state);
        }
    }

    /// Start a new context; it runs once the spawner yields
    pub fn spawn(
        self: &Arc<Self>,
        name: &str,
        stack_size: Option<usize>,
        body: ContextBody,
    ) -> HostResult<HostThreadId> {
        let id = {
            let mut state = self.state.lock();
            let id = HostThreadId(state.next_id);
            state.next_id += 1;
            state.live += 1;
            id
        };

        let mut builder = thread::Builder::new().name(name.to_string());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size.max(MIN_STACK_SIZE));
        }

        let scheduler = Arc::clone(self);
        if let Err(e) = builder.spawn(move || scheduler.run_context(id, body)) {
            self.state.lock().live -= 1;
            error!("Host refused context {}: {}", name, e);
            return Err(HostError::SpawnFailed(e.to_string().into()));
        }

        self.state.lock().ready.push_back(id);
        debug!("Spawned context {} ({})", id, name);
        Ok(id)
    }

    fn run_context(&self, id: HostThreadId, body: ContextBody) {
        {
            let mut state = self.state.lock();
            state.contexts.insert(thread::current().id(), id);
            while state.current != Some(id) {
                self.baton.wait(&mut state);
            }
        }

        if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
            error!("Context {} panicked", id);
        }

        let mut state = self.state.lock();
        state.contexts.remove(&thread::current().id());
        state.live -= 1;
        state.current = state.ready.pop_front();
        state.switches += 1;
        self.baton.notify_all();
        debug!("Context {} finished", id);
    }

    /// Contexts alive, main included
    pub fn live_contexts(&self) -> usize {
        self.state.lock().live
    }

    pub fn ready_len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Baton handoffs so far
    pub fn switches(&self) -> u64 {
        self.state.lock().switches
    }
}
