//! Basic usage examples for Pool

use listpool::{Pool, PoolConfiguration, PoolError};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    id: usize,
}

fn connection_config(max: usize) -> PoolConfiguration<Connection> {
    let next_id = Arc::new(AtomicUsize::new(1));

    PoolConfiguration::new()
        .with_min_count(2)
        .with_max_count(max)
        .with_timeout(Duration::from_millis(100))
        .with_factory(move || {
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            println!("   [factory] opening connection {}", id);
            Ok::<_, io::Error>(Connection { id })
        })
        .with_destroy(|conn: Connection| {
            println!("   [destroy] closing connection {}", conn.id);
            Ok::<_, io::Error>(())
        })
}

fn main() {
    println!("=== listpool - Basic Examples ===\n");

    // Example 1: Get and put
    get_and_put();

    // Example 2: Guarded access
    guarded_access();

    // Example 3: Exhaustion and timeout
    exhaustion();

    // Example 4: Release
    release();
}

fn get_and_put() {
    println!("1. Get and Put:");
    let pool = Pool::new(connection_config(4)).unwrap();
    println!("   Idle after creation: {}", pool.len());

    let conn = pool.get().unwrap();
    println!("   Got connection {}", conn.id);
    println!("   Idle: {}, outstanding: {}", pool.len(), pool.outstanding());

    pool.put(conn).unwrap();
    println!("   Idle after put: {}\n", pool.len());
}

fn guarded_access() {
    println!("2. Guarded Access:");
    let pool = Pool::new(connection_config(4)).unwrap();

    {
        let conn = pool.get_guarded().unwrap();
        println!("   Using connection {}", conn.id);
        // Returned when dropped
    }

    println!("   Idle after guard dropped: {}\n", pool.len());
}

fn exhaustion() {
    println!("3. Exhaustion:");
    let pool = Pool::new(connection_config(2)).unwrap();

    let first = pool.get().unwrap();
    let second = pool.get().unwrap();

    match pool.get() {
        Ok(_) => println!("   Unexpectedly got a third connection"),
        Err(PoolError::AcquireTimeout(after)) => println!("   Timed out after {:?}", after),
        Err(e) => println!("   Error: {}", e),
    }

    pool.put(first).unwrap();
    pool.close(second).unwrap();
    println!("   Idle: {}, outstanding: {}\n", pool.len(), pool.outstanding());
}

fn release() {
    println!("4. Release:");
    let pool = Pool::new(connection_config(4)).unwrap();
    let held = pool.get().unwrap();

    let failures = pool.release();
    println!("   Released with {} destructor failures", failures.len());

    // Outstanding resources are the caller's to close.
    if let Err(rejected) = pool.put(held) {
        println!("   Put after release: {}", rejected);
        pool.close(rejected.into_resource()).unwrap();
    }

    let metrics = pool.export_metrics();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
