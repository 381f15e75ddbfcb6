//! Multi-threaded behaviour of the pool

use crossbeam::channel;
use listpool::{Pool, PoolConfiguration, PoolError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn counting_pool(min: usize, max: usize, timeout: Duration) -> (Pool<usize>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let next = Arc::clone(&created);
    let pool = Pool::new(
        PoolConfiguration::new()
            .with_min_count(min)
            .with_max_count(max)
            .with_timeout(timeout)
            .with_factory(move || Ok::<_, io::Error>(next.fetch_add(1, Ordering::SeqCst)))
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap();
    (pool, created)
}

#[test]
fn blocked_get_is_woken_by_put() {
    let (pool, created) = counting_pool(0, 1, Duration::from_secs(10));
    let held = pool.get().unwrap();

    let (started_tx, started_rx) = channel::bounded(1);
    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            started_tx.send(()).unwrap();
            pool.get()
        })
    };

    started_rx.recv().unwrap();
    thread::sleep(Duration::from_millis(50));
    pool.put(held).unwrap();

    let got = waiter.join().unwrap().unwrap();
    assert_eq!(got, held);
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(pool.outstanding(), 1);
}

#[test]
fn blocked_get_is_woken_by_close() {
    let (pool, created) = counting_pool(0, 1, Duration::from_secs(10));
    let held = pool.get().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || pool.get())
    };

    thread::sleep(Duration::from_millis(50));
    pool.close(held).unwrap();

    // The freed slot is filled by a fresh resource.
    let got = waiter.join().unwrap().unwrap();
    assert_eq!(got, 1);
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_creation_wakes_blocked_get() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_factory = Arc::clone(&calls);
    let (creating_tx, creating_rx) = channel::bounded(1);

    let pool = Pool::new(
        PoolConfiguration::new()
            .with_max_count(1)
            .with_timeout(Duration::from_secs(10))
            .with_factory(move || {
                let n = calls_in_factory.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    creating_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(200));
                    return Err(io::Error::other("backend unavailable"));
                }
                Ok(n)
            })
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap();

    let first = {
        let pool = pool.clone();
        thread::spawn(move || pool.get())
    };

    // The only slot is now reserved by the running factory call.
    creating_rx.recv().unwrap();
    let second = {
        let pool = pool.clone();
        thread::spawn(move || {
            let started = Instant::now();
            (pool.get(), started.elapsed())
        })
    };

    assert!(matches!(first.join().unwrap(), Err(PoolError::Creation(_))));

    let (result, waited) = second.join().unwrap();
    assert_eq!(result.unwrap(), 1);
    assert!(waited < Duration::from_secs(5));
    assert_eq!(pool.outstanding(), 1);
}

#[test]
fn unbounded_timeout_waits_for_put() {
    let (pool, created) = counting_pool(0, 1, Duration::MAX);
    let held = pool.get().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || pool.get())
    };

    thread::sleep(Duration::from_millis(50));
    pool.put(held).unwrap();

    assert_eq!(waiter.join().unwrap().unwrap(), held);
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn release_wakes_blocked_get() {
    let (pool, _) = counting_pool(0, 1, Duration::from_secs(30));
    let _held = pool.get().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            let started = Instant::now();
            (pool.get(), started.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(pool.release().is_empty());

    let (result, waited) = waiter.join().unwrap();
    assert!(matches!(result, Err(PoolError::PoolClosed)));
    assert!(waited < Duration::from_secs(10));
}

#[test]
fn concurrent_getters_never_share_a_resource() {
    const MAX: usize = 4;
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let (pool, created) = counting_pool(1, MAX, Duration::from_secs(10));
    let in_use = Arc::new(Mutex::new(HashSet::new()));

    crossbeam::scope(|scope| {
        for _ in 0..THREADS {
            let pool = &pool;
            let in_use = Arc::clone(&in_use);
            scope.spawn(move |_| {
                for _ in 0..ROUNDS {
                    let res = pool.get().unwrap();
                    assert!(in_use.lock().insert(res), "resource {} handed out twice", res);
                    let health = pool.get_health_status();
                    assert!(health.idle_resources + health.outstanding_resources <= MAX);
                    thread::yield_now();
                    assert!(in_use.lock().remove(&res));
                    pool.put(res).unwrap();
                }
            });
        }
    })
    .unwrap();

    assert!(created.load(Ordering::SeqCst) <= MAX);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.len(), created.load(Ordering::SeqCst));
    assert_eq!(pool.get_metrics().total_returned, THREADS * ROUNDS);
}

#[test]
fn release_races_cleanly_with_users() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let destroyed_in_destroy = Arc::clone(&destroyed);
    let created = Arc::new(AtomicUsize::new(0));
    let next = Arc::clone(&created);

    let pool = Pool::new(
        PoolConfiguration::new()
            .with_min_count(2)
            .with_max_count(3)
            .with_timeout(Duration::from_millis(200))
            .with_factory(move || Ok::<_, io::Error>(next.fetch_add(1, Ordering::SeqCst)))
            .with_destroy(move |_| {
                destroyed_in_destroy.fetch_add(1, Ordering::SeqCst);
                Ok::<_, io::Error>(())
            }),
    )
    .unwrap();

    crossbeam::scope(|scope| {
        for _ in 0..4 {
            let pool = &pool;
            scope.spawn(move |_| {
                loop {
                    match pool.get() {
                        Ok(res) => {
                            if let Err(rejected) = pool.put(res) {
                                assert!(matches!(rejected.error(), PoolError::PoolClosed));
                                pool.close(rejected.into_resource()).unwrap();
                            }
                        }
                        Err(PoolError::PoolClosed) => break,
                        Err(PoolError::AcquireTimeout(_)) => {}
                        Err(other) => panic!("unexpected error: {}", other),
                    }
                }
            });
        }

        thread::sleep(Duration::from_millis(30));
        pool.release();
    })
    .unwrap();

    // Every resource ever created has been destroyed exactly once.
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(destroyed.load(Ordering::SeqCst), created.load(Ordering::SeqCst));
}
