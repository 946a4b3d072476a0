/*!
 * Thread Tests
 * Cooperative pthread emulation through the process facade
 */

use parking_lot::Mutex;
use posix9::core::{Errno, Posix9Config};
use posix9::threads::*;
use posix9::Posix9;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_create_runs_at_next_yield_and_joins() {
    let posix = Posix9::simulated();
    let ran = Arc::new(AtomicUsize::new(0));
    let r = ran.clone();
    let id = posix
        .pthread_create(&ThreadAttr::default(), move || {
            r.fetch_add(1, Ordering::SeqCst);
            42
        })
        .unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(posix.pthread_join(id), Ok(42));
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    // Joined threads are freed
    assert_eq!(posix.pthread_join(id), Err(ThreadError::NoSuchThread(id)));
    assert_eq!(posix.errno(), Some(Errno::ESRCH));
}

#[test]
fn test_pthread_exit_value() {
    let posix = Posix9::simulated();
    let p = posix.clone();
    let id = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.pthread_exit(7);
        })
        .unwrap();
    assert_eq!(posix.pthread_join(id), Ok(7));
}

#[test]
fn test_join_self_and_detached() {
    let posix = Posix9::simulated();
    let me = posix.pthread_self();
    assert_eq!(me, posix.thread_manager().main_thread());
    assert!(matches!(
        posix.pthread_join(me),
        Err(ThreadError::Deadlock(_))
    ));
    assert_eq!(posix.errno(), Some(Errno::EDEADLK));

    let id = posix
        .pthread_create(&ThreadAttr::detached(), || 0)
        .unwrap();
    let err = posix.pthread_join(id).unwrap_err();
    assert_eq!(err.errno(), Errno::EINVAL);
}

#[test]
fn test_self_inside_thread() {
    let posix = Posix9::simulated();
    let seen = Arc::new(Mutex::new(None));
    let (p, s) = (posix.clone(), seen.clone());
    let id = posix
        .pthread_create(&ThreadAttr::default().with_name("worker"), move || {
            *s.lock() = Some(p.pthread_self());
            0
        })
        .unwrap();
    posix.pthread_join(id).unwrap();
    assert_eq!(*seen.lock(), Some(id));
}

#[test]
fn test_mutex_serializes_critical_sections() {
    let posix = Posix9::simulated();
    let mutex = Arc::new(posix.pthread_mutex_init(MutexKind::Normal));
    let counter = Arc::new(AtomicUsize::new(0));

    let ids: Vec<ThreadId> = (0..3)
        .map(|_| {
            let (p, m, c) = (posix.clone(), mutex.clone(), counter.clone());
            posix
                .pthread_create(&ThreadAttr::default(), move || {
                    for _ in 0..5 {
                        p.pthread_mutex_lock(&m).unwrap();
                        let v = c.load(Ordering::SeqCst);
                        // Another thread would see the stale value here
                        p.pthread_yield();
                        c.store(v + 1, Ordering::SeqCst);
                        p.pthread_mutex_unlock(&m).unwrap();
                        p.pthread_yield();
                    }
                    0
                })
                .unwrap()
        })
        .collect();

    for id in ids {
        posix.pthread_join(id).unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 15);
    assert!(!mutex.is_locked());
}

#[test]
fn test_recursive_mutex_balances() {
    let posix = Posix9::simulated();
    let mutex = posix.pthread_mutex_init(MutexKind::Recursive);
    posix.pthread_mutex_lock(&mutex).unwrap();
    posix.pthread_mutex_lock(&mutex).unwrap();
    posix.pthread_mutex_unlock(&mutex).unwrap();
    assert!(mutex.is_locked());
    posix.pthread_mutex_unlock(&mutex).unwrap();
    assert!(!mutex.is_locked());
    assert_eq!(posix.pthread_mutex_unlock(&mutex), Err(ThreadError::NotOwner));
}

#[test]
fn test_condvar_handoff() {
    let posix = Posix9::simulated();
    let mutex = Arc::new(posix.pthread_mutex_init(MutexKind::Normal));
    let cond = Arc::new(PthreadCond::new());
    let ready = Arc::new(AtomicUsize::new(0));

    let (p, m, c, r) = (posix.clone(), mutex.clone(), cond.clone(), ready.clone());
    let consumer = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.pthread_mutex_lock(&m).unwrap();
            while r.load(Ordering::SeqCst) == 0 {
                p.pthread_cond_wait(&c, &m).unwrap();
            }
            let value = r.load(Ordering::SeqCst);
            p.pthread_mutex_unlock(&m).unwrap();
            value
        })
        .unwrap();

    // Let the consumer block in the wait
    posix.pthread_yield();
    assert_eq!(cond.waiters(), 1);

    posix.pthread_mutex_lock(&mutex).unwrap();
    ready.store(99, Ordering::SeqCst);
    posix.pthread_cond_signal(&cond);
    posix.pthread_mutex_unlock(&mutex).unwrap();

    assert_eq!(posix.pthread_join(consumer), Ok(99));
    assert_eq!(cond.waiters(), 0);
}

#[test]
fn test_cond_broadcast_wakes_all() {
    let posix = Posix9::simulated();
    let mutex = Arc::new(posix.pthread_mutex_init(MutexKind::Normal));
    let cond = Arc::new(PthreadCond::new());
    let go = Arc::new(AtomicUsize::new(0));

    let ids: Vec<ThreadId> = (0..3)
        .map(|i| {
            let (p, m, c, g) = (posix.clone(), mutex.clone(), cond.clone(), go.clone());
            posix
                .pthread_create(&ThreadAttr::default(), move || {
                    p.pthread_mutex_lock(&m).unwrap();
                    while g.load(Ordering::SeqCst) == 0 {
                        p.pthread_cond_wait(&c, &m).unwrap();
                    }
                    p.pthread_mutex_unlock(&m).unwrap();
                    i
                })
                .unwrap()
        })
        .collect();

    while cond.waiters() < 3 {
        posix.pthread_yield();
    }
    posix.pthread_mutex_lock(&mutex).unwrap();
    go.store(1, Ordering::SeqCst);
    posix.pthread_cond_broadcast(&cond);
    posix.pthread_mutex_unlock(&mutex).unwrap();

    let results: Vec<usize> = ids
        .into_iter()
        .map(|id| posix.pthread_join(id).unwrap())
        .collect();
    assert_eq!(results, vec![0, 1, 2]);
    assert_eq!(cond.waiters(), 0);
}

#[test]
fn test_cond_timedwait_times_out_holding_mutex() {
    let posix = Posix9::simulated();
    let mutex = posix.pthread_mutex_init(MutexKind::ErrorCheck);
    let cond = PthreadCond::new();

    posix.pthread_mutex_lock(&mutex).unwrap();
    let start = posix.yielder().now();
    assert_eq!(
        posix.pthread_cond_timedwait(&cond, &mutex, Duration::from_millis(500)),
        Err(ThreadError::TimedOut)
    );
    assert!(posix.yielder().now() - start >= 30);
    assert_eq!(mutex.owner(), Some(posix.pthread_self()));
    assert_eq!(cond.waiters(), 0);
    assert_eq!(posix.errno(), Some(Errno::ETIMEDOUT));
}

#[test]
fn test_once_runs_initializer_once() {
    let posix = Posix9::simulated();
    let once = Arc::new(PthreadOnce::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let ids: Vec<ThreadId> = (0..3)
        .map(|_| {
            let (p, o, r) = (posix.clone(), once.clone(), runs.clone());
            posix
                .pthread_create(&ThreadAttr::default(), move || {
                    p.pthread_once(&o, || {
                        r.fetch_add(1, Ordering::SeqCst);
                        // Other callers arrive while this runs
                        p.pthread_yield();
                    });
                    0
                })
                .unwrap()
        })
        .collect();
    for id in ids {
        posix.pthread_join(id).unwrap();
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(once.is_done());
}

#[test]
fn test_thread_specific_data_and_destructor() {
    let posix = Posix9::simulated();
    let destroyed: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let d = destroyed.clone();
    let destructor: KeyDestructor = Arc::new(move |value: usize| d.lock().push(value));
    let key = posix.pthread_key_create(Some(destructor)).unwrap();

    posix.pthread_setspecific(key, 1).unwrap();
    let p = posix.clone();
    let id = posix
        .pthread_create(&ThreadAttr::default(), move || {
            assert_eq!(p.pthread_getspecific(key), None);
            p.pthread_setspecific(key, 2).unwrap();
            p.pthread_getspecific(key).unwrap_or(0)
        })
        .unwrap();

    assert_eq!(posix.pthread_join(id), Ok(2));
    assert_eq!(*destroyed.lock(), vec![2]);
    assert_eq!(posix.pthread_getspecific(key), Some(1));

    posix.pthread_key_delete(key).unwrap();
    assert_eq!(posix.pthread_getspecific(key), None);
}

#[test]
fn test_cancel_reports_canceled() {
    let posix = Posix9::simulated();
    let spins = Arc::new(AtomicUsize::new(0));
    let p = posix.clone();
    let s = spins.clone();
    let id = posix
        .pthread_create(&ThreadAttr::default(), move || loop {
            s.fetch_add(1, Ordering::SeqCst);
            p.pthread_yield();
            p.pthread_testcancel();
        })
        .unwrap();

    posix.pthread_yield();
    posix.pthread_cancel(id).unwrap();
    // Cancellation is deferred until the target stops
    assert!(posix.thread_manager().info(id).is_some_and(|info| !info.finished));
    assert_eq!(posix.pthread_join(id), Ok(PTHREAD_CANCELED));

    let stopped_at = spins.load(Ordering::SeqCst);
    for _ in 0..10 {
        posix.pthread_yield();
    }
    assert_eq!(spins.load(Ordering::SeqCst), stopped_at);
    assert_eq!(posix.pthread_join(id), Err(ThreadError::NoSuchThread(id)));
}

#[test]
fn test_once_retries_after_initializer_exits() {
    let posix = Posix9::simulated();
    let once = Arc::new(PthreadOnce::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let (p, o) = (posix.clone(), once.clone());
    let first = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.pthread_once(&o, || p.pthread_exit(7));
            0
        })
        .unwrap();
    assert_eq!(posix.pthread_join(first), Ok(7));
    assert!(!once.is_done());

    let (p, o, r) = (posix.clone(), once.clone(), runs.clone());
    let second = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.pthread_once(&o, || {
                r.fetch_add(1, Ordering::SeqCst);
            });
            1
        })
        .unwrap();
    assert_eq!(posix.pthread_join(second), Ok(1));
    assert!(once.is_done());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_thread_table_full() {
    let config = Posix9Config {
        max_threads: 2,
        ..Posix9Config::default()
    };
    let posix = Posix9::simulated_with(config).unwrap();
    let first = posix.pthread_create(&ThreadAttr::default(), || 0).unwrap();

    let err = posix
        .pthread_create(&ThreadAttr::default(), || 0)
        .unwrap_err();
    assert!(matches!(err, ThreadError::ResourceExhausted(_)));
    assert_eq!(posix.errno(), Some(Errno::EAGAIN));

    posix.pthread_join(first).unwrap();
    assert!(posix.pthread_create(&ThreadAttr::detached(), || 0).is_ok());
}

#[test]
fn test_rwlock_writer_waits_for_readers() {
    let posix = Posix9::simulated();
    let lock = Arc::new(posix.pthread_rwlock_init());
    let order = Arc::new(Mutex::new(Vec::new()));

    posix.pthread_rwlock_rdlock(&lock).unwrap();
    let (p, l, o) = (posix.clone(), lock.clone(), order.clone());
    let writer = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.pthread_rwlock_wrlock(&l).unwrap();
            o.lock().push("write");
            p.pthread_rwlock_unlock(&l).unwrap();
            0
        })
        .unwrap();

    posix.pthread_yield();
    posix.pthread_yield();
    order.lock().push("read done");
    posix.pthread_rwlock_unlock(&lock).unwrap();

    posix.pthread_join(writer).unwrap();
    assert_eq!(*order.lock(), vec!["read done", "write"]);
}
