//! Health snapshot for resource pools

/// Health status of a pool
///
/// This is a capacity report only; the pool never probes the resources it
/// holds.
///
/// # Examples
///
/// ```
/// use listpool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(
///     PoolConfiguration::new()
///         .with_min_count(3)
///         .with_max_count(10)
///         .with_factory(|| Ok::<_, std::io::Error>(()))
///         .with_destroy(|_| Ok::<_, std::io::Error>(())),
/// )
/// .unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.idle_resources, 3);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Current pool utilization (0.0 to 1.0)
    pub utilization: f64,

    /// Idle resources count
    pub idle_resources: usize,

    /// Checked out resources count
    pub outstanding_resources: usize,

    /// Total capacity
    pub total_capacity: usize,

    /// Whether the pool has been released
    pub released: bool,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a new health status
    pub fn new(idle: usize, outstanding: usize, capacity: usize, released: bool) -> Self {
        let utilization = if capacity > 0 {
            outstanding as f64 / capacity as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if released {
            warnings.push("Pool has been released".to_string());
            is_healthy = false;
        }

        // Check for high utilization
        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if !released && capacity > 0 && outstanding >= capacity {
            warnings.push("Pool is exhausted".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            idle_resources: idle,
            outstanding_resources: outstanding,
            total_capacity: capacity,
            released,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_pool_is_unhealthy() {
        let status = HealthStatus::new(0, 4, 4, false);
        assert!(!status.is_healthy());
        assert_eq!(status.warning_count, 2);
    }

    #[test]
    fn test_released_pool_is_unhealthy() {
        let status = HealthStatus::new(0, 0, 4, true);
        assert!(!status.is_healthy());
        assert_eq!(status.warnings, vec!["Pool has been released".to_string()]);
    }
}
