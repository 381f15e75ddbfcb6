//! Error types for the resource pool

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by caller-supplied factory and destructor callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to pre-populate the pool ({} rollback failures)", .rollback_failures.len())]
    Initialization {
        #[source]
        source: BoxError,
        /// Destructor failures hit while rolling back already created resources
        rollback_failures: Vec<BoxError>,
    },

    #[error("Factory failed to create a resource")]
    Creation(#[source] BoxError),

    #[error("No resource became available within {0:?}")]
    AcquireTimeout(Duration),

    #[error("Resource is nil")]
    NilResource,

    #[error("Destructor failed to destroy a resource")]
    Destruction(#[source] BoxError),

    #[error("Pool has been released")]
    PoolClosed,

    #[error("Resource was returned but nothing is checked out")]
    NotCheckedOut,
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Error returned by [`Pool::put`](crate::Pool::put).
///
/// A rejected resource is handed back to the caller, who stays responsible
/// for it (for example by passing it to [`Pool::close`](crate::Pool::close)).
#[derive(Error)]
#[error("{error}")]
pub struct PutError<T> {
    error: PoolError,
    resource: Option<T>,
}

impl<T> PutError<T> {
    pub(crate) fn new(error: PoolError, resource: Option<T>) -> Self {
        Self { error, resource }
    }

    /// The reason the resource was rejected
    pub fn error(&self) -> &PoolError {
        &self.error
    }

    /// Take back the rejected resource (`None` if a nil resource was put)
    pub fn into_resource(self) -> Option<T> {
        self.resource
    }

    /// Split into the error and the rejected resource
    pub fn into_parts(self) -> (PoolError, Option<T>) {
        (self.error, self.resource)
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("error", &self.error)
            .field("has_resource", &self.resource.is_some())
            .finish()
    }
}

impl<T> From<PutError<T>> for PoolError {
    fn from(err: PutError<T>) -> Self {
        err.error
    }
}
