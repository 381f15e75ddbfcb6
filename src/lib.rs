//! # listpool
//!
//! Bounded, thread-safe resource pool for Rust. Resources are built by a
//! caller-supplied factory and torn down by a caller-supplied destructor;
//! the pool only stores them and keeps the books.
//!
//! ## Features
//!
//! - Eager pre-population of `min_count` resources, lazy creation up to `max_count`
//! - FIFO reuse of idle resources
//! - Blocking `get` with timeout, non-blocking `try_get`, async `get_async`
//! - Automatic return of resources via RAII (`PooledObject`)
//! - Best-effort teardown with collected destructor failures
//! - Metrics and Prometheus export
//! - Health snapshot
//!
//! ## Quick Start
//!
//! ```rust
//! use listpool::{Pool, PoolConfiguration};
//! use std::time::Duration;
//!
//! let pool = Pool::new(
//!     PoolConfiguration::new()
//!         .with_min_count(2)
//!         .with_max_count(4)
//!         .with_timeout(Duration::from_secs(1))
//!         .with_factory(|| Ok::<_, std::io::Error>(String::from("connection")))
//!         .with_destroy(|conn: String| {
//!             println!("closing {}", conn);
//!             Ok::<_, std::io::Error>(())
//!         }),
//! )
//! .unwrap();
//!
//! {
//!     let conn = pool.get_guarded().unwrap();
//!     println!("Got: {}", *conn);
//!     // Resource automatically returned when `conn` goes out of scope
//! }
//!
//! assert_eq!(pool.len(), 2);
//! pool.release();
//! ```

mod pool;
mod config;
mod metrics;
mod health;
mod errors;

pub use pool::{Pool, PooledObject};
pub use config::PoolConfiguration;
pub use metrics::{PoolMetrics, MetricsExporter};
pub use health::HealthStatus;
pub use errors::{BoxError, PoolError, PoolResult, PutError};
