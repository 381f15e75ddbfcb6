//! Core resource pool implementation

use crate::config::{Destroyer, Factory, PoolConfiguration, ValidConfiguration};
use crate::errors::{PoolError, PoolResult, PutError};
use crate::health::HealthStatus;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

const ASYNC_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct PoolState<T> {
    idle: VecDeque<T>,
    /// Checked out resources, plus slots whose factory call is still running
    outstanding: usize,
    released: bool,
}

struct Shared<T> {
    state: Mutex<PoolState<T>>,
    capacity_freed: Condvar,
    factory: Factory<T>,
    destroyer: Destroyer<T>,
    min_count: usize,
    max_count: usize,
    timeout: Duration,
    metrics: MetricsTracker,
}

impl<T> Shared<T> {
    fn destroy(&self, resource: T) -> PoolResult<()> {
        MetricsTracker::increment(&self.metrics.total_destroyed);
        (self.destroyer)(resource).map_err(|source| {
            MetricsTracker::increment(&self.metrics.destruction_failures);
            tracing::warn!(error = %source, "Destructor failed to destroy resource");
            PoolError::Destruction(source)
        })
    }

    /// Destroy every resource, collecting failures instead of stopping at one
    fn destroy_all(&self, resources: VecDeque<T>) -> Vec<PoolError> {
        resources
            .into_iter()
            .filter_map(|resource| self.destroy(resource).err())
            .collect()
    }

    /// Forget one outstanding resource and let a waiter retry
    fn free_slot(&self) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        drop(state);
        self.capacity_freed.notify_one();
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.released {
            return;
        }

        let idle = mem::take(&mut state.idle);
        if idle.is_empty() {
            return;
        }

        let count = idle.len();
        let failures = self.destroy_all(idle);
        tracing::debug!(
            destroyed = count,
            failures = failures.len(),
            "Destroyed idle resources of dropped pool"
        );
    }
}

/// A slot counted as outstanding while the factory runs outside the lock.
///
/// Hands the slot back when dropped without being committed, which also
/// covers a panicking factory.
struct SlotReservation<'a, T> {
    shared: &'a Shared<T>,
    committed: bool,
}

impl<T> SlotReservation<'_, T> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl<T> Drop for SlotReservation<'_, T> {
    fn drop(&mut self) {
        if !self.committed {
            self.shared.free_slot();
        }
    }
}

#[derive(Clone, Copy)]
enum Wait {
    Never,
    Until(Instant),
    Forever,
}

impl Wait {
    fn for_timeout(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Wait::Forever, Wait::Until)
    }
}

/// Bounded, thread-safe pool of resources built by a factory and torn down
/// by a destructor.
///
/// Idle resources are handed out oldest first. When none are idle the pool
/// creates new ones until `max_count` resources exist, after which `get`
/// waits up to the configured timeout for one to be returned or closed.
///
/// Cloning a `Pool` yields another handle to the same pool.
///
/// # Examples
///
/// ```
/// use listpool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(
///     PoolConfiguration::new()
///         .with_min_count(3)
///         .with_max_count(5)
///         .with_factory(|| Ok::<_, std::io::Error>(Vec::<u8>::with_capacity(64)))
///         .with_destroy(|_buf| Ok::<_, std::io::Error>(())),
/// )
/// .unwrap();
///
/// assert_eq!(pool.len(), 3);
///
/// let buf = pool.get().unwrap();
/// assert_eq!(pool.len(), 2);
///
/// pool.put(buf).unwrap();
/// assert_eq!(pool.len(), 3);
///
/// assert!(pool.release().is_empty());
/// assert!(pool.get().is_err());
/// ```
pub struct Pool<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Pool")
            .field("idle", &state.idle.len())
            .field("outstanding", &state.outstanding)
            .field("released", &state.released)
            .field("min_count", &self.shared.min_count)
            .field("max_count", &self.shared.max_count)
            .field("timeout", &self.shared.timeout)
            .finish()
    }
}

impl<T> Pool<T> {
    /// Create a pool and eagerly build `min_count` resources.
    ///
    /// If the factory fails part way, every resource created so far is
    /// passed to the destructor before the error is returned.
    pub fn new(config: PoolConfiguration<T>) -> PoolResult<Self> {
        let ValidConfiguration {
            min_count,
            max_count,
            timeout,
            factory,
            destroyer,
        } = config.into_valid()?;

        let metrics = MetricsTracker::new();
        let mut idle = VecDeque::with_capacity(min_count);

        for _ in 0..min_count {
            match factory() {
                Ok(resource) => {
                    MetricsTracker::increment(&metrics.total_created);
                    idle.push_back(resource);
                }
                Err(source) => {
                    let created = idle.len();
                    let rollback_failures: Vec<_> = idle
                        .into_iter()
                        .filter_map(|resource| destroyer(resource).err())
                        .collect();

                    for failure in &rollback_failures {
                        tracing::warn!(error = %failure, "Destructor failed during pool rollback");
                    }
                    tracing::warn!(
                        error = %source,
                        created,
                        min_count,
                        "Factory failed while pre-populating pool"
                    );

                    return Err(PoolError::Initialization {
                        source,
                        rollback_failures,
                    });
                }
            }
        }

        tracing::debug!(
            min_count,
            max_count,
            timeout = ?timeout,
            "Created new resource pool"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    idle,
                    outstanding: 0,
                    released: false,
                }),
                capacity_freed: Condvar::new(),
                factory,
                destroyer,
                min_count,
                max_count,
                timeout,
                metrics,
            }),
        })
    }

    /// Get a resource, waiting up to the configured timeout if the pool is
    /// exhausted.
    ///
    /// Returns [`PoolError::AcquireTimeout`] if nothing became available in
    /// time, [`PoolError::Creation`] if the factory failed, and
    /// [`PoolError::PoolClosed`] after [`release`](Self::release).
    pub fn get(&self) -> PoolResult<T> {
        let timeout = self.shared.timeout;
        match self.acquire(Wait::for_timeout(timeout))? {
            Some(resource) => Ok(resource),
            None => Err(self.timed_out(timeout)),
        }
    }

    /// Get a resource without waiting; `Ok(None)` if the pool is exhausted
    ///
    /// # Examples
    ///
    /// ```
    /// use listpool::{Pool, PoolConfiguration};
    ///
    /// let pool = Pool::new(
    ///     PoolConfiguration::new()
    ///         .with_max_count(1)
    ///         .with_factory(|| Ok::<_, std::io::Error>(1))
    ///         .with_destroy(|_| Ok::<_, std::io::Error>(())),
    /// )
    /// .unwrap();
    ///
    /// let first = pool.try_get().unwrap();
    /// assert_eq!(first, Some(1));
    /// assert_eq!(pool.try_get().unwrap(), None);
    /// ```
    pub fn try_get(&self) -> PoolResult<Option<T>> {
        self.acquire(Wait::Never)
    }

    /// Get a resource asynchronously, bounded by the configured timeout.
    ///
    /// Must be awaited inside a Tokio runtime with the time driver enabled.
    pub async fn get_async(&self) -> PoolResult<T> {
        let timeout = self.shared.timeout;

        let polled = tokio::time::timeout(timeout, async {
            loop {
                match self.try_get() {
                    Ok(Some(resource)) => return Ok(resource),
                    Ok(None) => tokio::time::sleep(ASYNC_POLL_INTERVAL).await,
                    Err(err) => return Err(err),
                }
            }
        })
        .await;

        match polled {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(timeout)),
        }
    }

    /// Get a resource wrapped in a guard that returns it when dropped
    pub fn get_guarded(&self) -> PoolResult<PooledObject<T>> {
        let resource = self.get()?;
        Ok(PooledObject::new(resource, self.clone()))
    }

    /// Return a checked out resource to the idle set.
    ///
    /// `None` stands for a nil resource and is rejected. A rejected resource
    /// is handed back inside the [`PutError`]; after [`release`](Self::release)
    /// the caller is responsible for destroying it, e.g. via
    /// [`close`](Self::close).
    ///
    /// # Examples
    ///
    /// ```
    /// use listpool::{Pool, PoolConfiguration, PoolError};
    ///
    /// let pool = Pool::new(
    ///     PoolConfiguration::new()
    ///         .with_min_count(1)
    ///         .with_factory(|| Ok::<_, std::io::Error>(5u16))
    ///         .with_destroy(|_| Ok::<_, std::io::Error>(())),
    /// )
    /// .unwrap();
    ///
    /// let res = pool.get().unwrap();
    /// pool.release();
    ///
    /// let rejected = pool.put(res).unwrap_err();
    /// assert!(matches!(rejected.error(), PoolError::PoolClosed));
    /// pool.close(rejected.into_resource()).unwrap();
    /// ```
    pub fn put(&self, resource: impl Into<Option<T>>) -> Result<(), PutError<T>> {
        let Some(resource) = resource.into() else {
            return Err(PutError::new(PoolError::NilResource, None));
        };

        let mut state = self.shared.state.lock();
        if state.released {
            return Err(PutError::new(PoolError::PoolClosed, Some(resource)));
        }
        if state.outstanding == 0 {
            return Err(PutError::new(PoolError::NotCheckedOut, Some(resource)));
        }

        state.outstanding -= 1;
        state.idle.push_back(resource);
        drop(state);

        self.shared.capacity_freed.notify_one();
        MetricsTracker::increment(&self.shared.metrics.total_returned);
        Ok(())
    }

    /// Destroy a checked out resource and free its slot.
    ///
    /// The slot is freed even when the destructor fails, in which case
    /// [`PoolError::Destruction`] is returned. Works before and after
    /// [`release`](Self::release).
    pub fn close(&self, resource: impl Into<Option<T>>) -> PoolResult<()> {
        let resource = resource.into().ok_or(PoolError::NilResource)?;

        let result = self.shared.destroy(resource);
        self.shared.free_slot();
        result
    }

    /// Tear the pool down: destroy every idle resource and refuse further
    /// `get` and `put` calls.
    ///
    /// Checked out resources are left alone; close them individually.
    /// Returns the destructor failures hit while draining, and nothing on
    /// repeated calls.
    pub fn release(&self) -> Vec<PoolError> {
        let (drained, outstanding) = {
            let mut state = self.shared.state.lock();
            if state.released {
                return Vec::new();
            }
            state.released = true;
            (mem::take(&mut state.idle), state.outstanding)
        };

        // Blocked getters wake up to PoolClosed.
        self.shared.capacity_freed.notify_all();

        tracing::debug!(idle = drained.len(), outstanding, "Releasing resource pool");
        self.shared.destroy_all(drained)
    }

    /// Number of idle resources. The value may be stale as soon as it is
    /// returned if other threads use the pool.
    pub fn len(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Whether no resources are idle
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of checked out resources
    pub fn outstanding(&self) -> usize {
        self.shared.state.lock().outstanding
    }

    /// Whether [`release`](Self::release) has been called
    pub fn is_released(&self) -> bool {
        self.shared.state.lock().released
    }

    pub fn min_count(&self) -> usize {
        self.shared.min_count
    }

    pub fn max_count(&self) -> usize {
        self.shared.max_count
    }

    pub fn timeout(&self) -> Duration {
        self.shared.timeout
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        let state = self.shared.state.lock();
        HealthStatus::new(
            state.idle.len(),
            state.outstanding,
            self.shared.max_count,
            state.released,
        )
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        let state = self.shared.state.lock();
        self.shared
            .metrics
            .get_metrics(state.outstanding, state.idle.len(), self.shared.max_count)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }

    fn acquire(&self, wait: Wait) -> PoolResult<Option<T>> {
        let shared = &*self.shared;
        let mut state = shared.state.lock();

        loop {
            if state.released {
                return Err(PoolError::PoolClosed);
            }

            if let Some(resource) = state.idle.pop_front() {
                state.outstanding += 1;
                MetricsTracker::increment(&shared.metrics.total_retrieved);
                return Ok(Some(resource));
            }

            if state.outstanding < shared.max_count {
                state.outstanding += 1;
                drop(state);
                return self.create().map(Some);
            }

            match wait {
                Wait::Never => return Ok(None),
                Wait::Until(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    shared.capacity_freed.wait_until(&mut state, deadline);
                }
                Wait::Forever => shared.capacity_freed.wait(&mut state),
            }
        }
    }

    /// Run the factory for a slot already counted as outstanding
    fn create(&self) -> PoolResult<T> {
        let shared = &*self.shared;
        let reservation = SlotReservation {
            shared,
            committed: false,
        };

        match (shared.factory)() {
            Ok(resource) => {
                reservation.commit();
                MetricsTracker::increment(&shared.metrics.total_created);
                MetricsTracker::increment(&shared.metrics.total_retrieved);
                tracing::debug!(max_count = shared.max_count, "Created new resource");
                Ok(resource)
            }
            Err(source) => {
                drop(reservation);
                MetricsTracker::increment(&shared.metrics.creation_failures);
                tracing::warn!(error = %source, "Factory failed to create resource");
                Err(PoolError::Creation(source))
            }
        }
    }

    fn timed_out(&self, timeout: Duration) -> PoolError {
        MetricsTracker::increment(&self.shared.metrics.acquire_timeouts);
        tracing::warn!(
            timeout = ?timeout,
            max_count = self.shared.max_count,
            "Timed out waiting for a resource"
        );
        PoolError::AcquireTimeout(timeout)
    }
}

/// A pooled resource that goes back to the pool when dropped.
///
/// If the pool was released in the meantime the resource is passed to the
/// destructor instead.
pub struct PooledObject<T> {
    value: Option<T>,
    pool: Pool<T>,
}

impl<T> PooledObject<T> {
    fn new(value: T, pool: Pool<T>) -> Self {
        Self {
            value: Some(value),
            pool,
        }
    }

    /// Take the resource out of the guard.
    ///
    /// It still counts as checked out; hand it back with [`Pool::put`] or
    /// [`Pool::close`].
    pub fn detach(mut self) -> T {
        self.value.take().expect("Value already taken")
    }

    /// Destroy the resource instead of returning it
    pub fn close(mut self) -> PoolResult<()> {
        let value = self.value.take();
        self.pool.close(value)
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledObject").field(&self.value).finish()
    }
}

impl<T> Drop for PooledObject<T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };

        if let Err(rejected) = self.pool.put(value) {
            let (error, value) = rejected.into_parts();
            tracing::debug!(error = %error, "Pool refused returned resource, destroying it");
            // Failures are already logged by the destructor wrapper.
            let _ = self.pool.close(value);
        }
    }
}
