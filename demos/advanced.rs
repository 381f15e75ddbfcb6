//! Advanced features: failure handling, health, Prometheus export

use listpool::{Pool, PoolConfiguration, PoolError};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Session {
    id: usize,
}

fn main() {
    println!("=== listpool - Advanced Features ===\n");

    // Example 1: Failing factory during warm-up
    failed_warmup();

    // Example 2: Failing destructor during release
    failed_release();

    // Example 3: Waiting across threads
    waiting_across_threads();

    // Example 4: Health and Prometheus metrics
    prometheus_export();
}

fn failed_warmup() {
    println!("1. Failed Warm-up:");
    let calls = Arc::new(AtomicUsize::new(0));

    let config = PoolConfiguration::new()
        .with_min_count(3)
        .with_factory(move || {
            let id = calls.fetch_add(1, Ordering::Relaxed);
            if id == 2 {
                return Err(io::Error::other("backend refused connection"));
            }
            Ok(Session { id })
        })
        .with_destroy(|s: Session| {
            println!("   Rolled back session {}", s.id);
            Ok::<_, io::Error>(())
        });

    match Pool::new(config) {
        Ok(_) => println!("   Pool created"),
        Err(PoolError::Initialization { source, rollback_failures }) => {
            println!("   Init failed: {} ({} rollback failures)", source, rollback_failures.len());
        }
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

fn failed_release() {
    println!("2. Failed Release:");
    let next = AtomicUsize::new(0);

    let pool = Pool::new(
        PoolConfiguration::new()
            .with_min_count(3)
            .with_factory(move || Ok::<_, io::Error>(Session { id: next.fetch_add(1, Ordering::Relaxed) }))
            .with_destroy(|s: Session| {
                if s.id == 1 {
                    Err(io::Error::other("session stuck"))
                } else {
                    Ok(())
                }
            }),
    )
    .unwrap();

    for failure in pool.release() {
        println!("   Teardown failure: {}", failure);
    }
    println!("   Idle after release: {}\n", pool.len());
}

fn waiting_across_threads() {
    println!("3. Waiting Across Threads:");
    let next = AtomicUsize::new(0);

    let pool = Pool::new(
        PoolConfiguration::new()
            .with_max_count(1)
            .with_timeout(Duration::from_secs(2))
            .with_factory(move || Ok::<_, io::Error>(Session { id: next.fetch_add(1, Ordering::Relaxed) }))
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap();

    let held = pool.get().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            let session = pool.get().unwrap();
            println!("   Waiter got session {}", session.id);
            pool.put(session).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(100));
    println!("   Returning session {}", held.id);
    pool.put(held).unwrap();
    waiter.join().unwrap();

    println!();
}

fn prometheus_export() {
    println!("4. Health and Prometheus Metrics:");
    let next = AtomicUsize::new(0);

    let pool = Pool::new(
        PoolConfiguration::new()
            .with_min_count(2)
            .with_max_count(5)
            .with_factory(move || Ok::<_, io::Error>(Session { id: next.fetch_add(1, Ordering::Relaxed) }))
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap();

    let _a = pool.get_guarded().unwrap();
    let _b = pool.get_guarded().unwrap();

    let health = pool.get_health_status();
    println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
    println!("   Utilization: {:.1}%", health.utilization * 100.0);

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "example".to_string());
    tags.insert("env".to_string(), "dev".to_string());

    println!("{}", pool.export_metrics_prometheus("example_pool", Some(&tags)));
}
