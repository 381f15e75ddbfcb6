//! Async usage examples

use listpool::{Pool, PoolConfiguration};
use std::io;
use std::time::Duration;
use tokio::time::sleep;

fn counter_pool(max: usize, timeout: Duration) -> Pool<u32> {
    let next = std::sync::atomic::AtomicU32::new(0);
    Pool::new(
        PoolConfiguration::new()
            .with_max_count(max)
            .with_timeout(timeout)
            .with_factory(move || {
                Ok::<_, io::Error>(next.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
            })
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap()
}

#[tokio::main]
async fn main() {
    println!("=== listpool - Async Examples ===\n");

    // Example 1: Async get
    async_get().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn async_get() {
    println!("1. Async Get:");
    let pool = counter_pool(3, Duration::from_secs(1));

    let res = pool.get_async().await.unwrap();
    println!("   Got resource asynchronously: {}", res);
    pool.put(res).unwrap();

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");
    let pool = counter_pool(1, Duration::from_millis(100));

    // Take the only slot
    let _res = pool.get_async().await.unwrap();

    match pool.get_async().await {
        Ok(_) => println!("   Got resource"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");
    let pool = counter_pool(3, Duration::from_secs(2));

    let mut handles = vec![];

    for i in 0..10 {
        let pool = pool.clone();
        let handle = tokio::spawn(async move {
            match pool.get_async().await {
                Ok(res) => {
                    println!("   Task {} got resource: {}", i, res);
                    sleep(Duration::from_millis(50)).await;
                    pool.put(res).unwrap();
                }
                Err(e) => println!("   Task {} couldn't get resource: {}", i, e),
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final idle: {}", pool.len());
    pool.release();
}
