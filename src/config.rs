//! Pool configuration options

use crate::errors::{BoxError, PoolError, PoolResult};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type Factory<T> = Arc<dyn Fn() -> Result<T, BoxError> + Send + Sync>;
pub(crate) type Destroyer<T> = Arc<dyn Fn(T) -> Result<(), BoxError> + Send + Sync>;

/// Configuration for a [`Pool`](crate::Pool)
///
/// # Examples
///
/// ```
/// use listpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_min_count(2)
///     .with_max_count(8)
///     .with_factory(|| Ok::<_, std::io::Error>(String::from("conn")))
///     .with_destroy(|_conn: String| Ok::<_, std::io::Error>(()))
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.min_count, 2);
/// assert_eq!(config.max_count, 8);
/// assert!(config.validate().is_ok());
/// ```
pub struct PoolConfiguration<T> {
    /// Number of resources created eagerly when the pool is built
    pub min_count: usize,

    /// Upper bound on idle plus checked out resources
    pub max_count: usize,

    /// How long `get` waits for capacity when the pool is exhausted
    pub timeout: Duration,

    pub(crate) factory: Option<Factory<T>>,
    pub(crate) destroyer: Option<Destroyer<T>>,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            min_count: 0,
            max_count: 100,
            timeout: Duration::from_secs(30),
            factory: None,
            destroyer: None,
        }
    }
}

impl<T> Clone for PoolConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            min_count: self.min_count,
            max_count: self.max_count,
            timeout: self.timeout,
            factory: self.factory.clone(),
            destroyer: self.destroyer.clone(),
        }
    }
}

impl<T> fmt::Debug for PoolConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("min_count", &self.min_count)
            .field("max_count", &self.max_count)
            .field("timeout", &self.timeout)
            .field("has_factory", &self.factory.is_some())
            .field("has_destroyer", &self.destroyer.is_some())
            .finish()
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of resources created up front
    pub fn with_min_count(mut self, count: usize) -> Self {
        self.min_count = count;
        self
    }

    /// Set the maximum number of resources the pool may hold or hand out
    pub fn with_max_count(mut self, count: usize) -> Self {
        self.max_count = count;
        self
    }

    /// Set the acquire timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the factory used to create new resources
    ///
    /// Any error type convertible into [`BoxError`] is accepted.
    pub fn with_factory<F, E>(mut self, factory: F) -> Self
    where
        T: 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.factory = Some(Arc::new(move || factory().map_err(Into::into)));
        self
    }

    /// Set the destructor used to tear resources down
    ///
    /// # Examples
    ///
    /// ```
    /// use listpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::<u32>::new()
    ///     .with_destroy(|_id| Ok::<_, std::fmt::Error>(()));
    ///
    /// // Still missing a factory.
    /// assert!(config.validate().is_err());
    /// ```
    pub fn with_destroy<F, E>(mut self, destroy: F) -> Self
    where
        T: 'static,
        F: Fn(T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.destroyer = Some(Arc::new(move |resource| destroy(resource).map_err(Into::into)));
        self
    }

    /// Check the bounds and callbacks, bounds first
    pub fn validate(&self) -> PoolResult<()> {
        self.clone().into_valid().map(|_| ())
    }

    pub(crate) fn into_valid(self) -> PoolResult<ValidConfiguration<T>> {
        if self.max_count < self.min_count {
            return Err(PoolError::InvalidConfig(format!(
                "max_count ({}) must not be less than min_count ({})",
                self.max_count, self.min_count
            )));
        }

        let (Some(factory), Some(destroyer)) = (self.factory, self.destroyer) else {
            return Err(PoolError::InvalidConfig(
                "both a factory and a destructor are required".to_string(),
            ));
        };

        Ok(ValidConfiguration {
            min_count: self.min_count,
            max_count: self.max_count,
            timeout: self.timeout,
            factory,
            destroyer,
        })
    }
}

/// A configuration whose bounds and callbacks have been checked
pub(crate) struct ValidConfiguration<T> {
    pub min_count: usize,
    pub max_count: usize,
    pub timeout: Duration,
    pub factory: Factory<T>,
    pub destroyer: Destroyer<T>,
}
