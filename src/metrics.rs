//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use listpool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(
///     PoolConfiguration::new()
///         .with_min_count(1)
///         .with_factory(|| Ok::<_, std::io::Error>(7u8))
///         .with_destroy(|_| Ok::<_, std::io::Error>(())),
/// )
/// .unwrap();
///
/// let res = pool.get().unwrap();
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.total_created, 1);
/// assert_eq!(metrics.total_retrieved, 1);
/// assert_eq!(metrics.outstanding_resources, 1);
/// pool.put(res).unwrap();
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMetrics {
    /// Resources produced by the factory
    pub total_created: usize,

    /// Resources passed to the destructor
    pub total_destroyed: usize,

    /// Successful acquisitions
    pub total_retrieved: usize,

    /// Resources returned through `put`
    pub total_returned: usize,

    /// Acquisitions that gave up after the timeout
    pub acquire_timeouts: usize,

    /// Factory calls that failed
    pub creation_failures: usize,

    /// Destructor calls that failed
    pub destruction_failures: usize,

    /// Current checked out resources
    pub outstanding_resources: usize,

    /// Current idle resources
    pub idle_resources: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    /// Maximum pool capacity
    pub max_capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("total_retrieved".to_string(), self.total_retrieved.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("acquire_timeouts".to_string(), self.acquire_timeouts.to_string());
        metrics.insert("creation_failures".to_string(), self.creation_failures.to_string());
        metrics.insert(
            "destruction_failures".to_string(),
            self.destruction_failures.to_string(),
        );
        metrics.insert(
            "outstanding_resources".to_string(),
            self.outstanding_resources.to_string(),
        );
        metrics.insert("idle_resources".to_string(), self.idle_resources.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use listpool::{Pool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = Pool::new(
    ///     PoolConfiguration::new()
    ///         .with_min_count(2)
    ///         .with_factory(|| Ok::<_, std::io::Error>(0u8))
    ///         .with_destroy(|_| Ok::<_, std::io::Error>(())),
    /// )
    /// .unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("db", Some(&tags));
    /// assert!(output.contains("listpool_resources_idle{pool=\"db\",service=\"api\"} 2"));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        Self::write_metric(
            &mut output,
            "listpool_resources_outstanding",
            "gauge",
            "Current checked out resources",
            &labels,
            metrics.outstanding_resources,
        );
        Self::write_metric(
            &mut output,
            "listpool_resources_idle",
            "gauge",
            "Current idle resources",
            &labels,
            metrics.idle_resources,
        );

        output.push_str("# HELP listpool_utilization Pool utilization ratio\n");
        output.push_str("# TYPE listpool_utilization gauge\n");
        output.push_str(&format!(
            "listpool_utilization{{{}}} {:.2}\n",
            labels, metrics.utilization
        ));

        // Counter metrics
        Self::write_metric(
            &mut output,
            "listpool_resources_created_total",
            "counter",
            "Total resources created",
            &labels,
            metrics.total_created,
        );
        Self::write_metric(
            &mut output,
            "listpool_resources_destroyed_total",
            "counter",
            "Total resources destroyed",
            &labels,
            metrics.total_destroyed,
        );
        Self::write_metric(
            &mut output,
            "listpool_resources_retrieved_total",
            "counter",
            "Total resources retrieved",
            &labels,
            metrics.total_retrieved,
        );
        Self::write_metric(
            &mut output,
            "listpool_resources_returned_total",
            "counter",
            "Total resources returned",
            &labels,
            metrics.total_returned,
        );
        Self::write_metric(
            &mut output,
            "listpool_acquire_timeouts_total",
            "counter",
            "Acquisitions that timed out",
            &labels,
            metrics.acquire_timeouts,
        );
        Self::write_metric(
            &mut output,
            "listpool_creation_failures_total",
            "counter",
            "Factory failures",
            &labels,
            metrics.creation_failures,
        );
        Self::write_metric(
            &mut output,
            "listpool_destruction_failures_total",
            "counter",
            "Destructor failures",
            &labels,
            metrics.destruction_failures,
        );

        output
    }

    fn write_metric(
        output: &mut String,
        name: &str,
        kind: &str,
        help: &str,
        labels: &str,
        value: usize,
    ) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut sorted: Vec<_> = tags.iter().collect();
            sorted.sort();
            for (key, value) in sorted {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub total_created: AtomicUsize,
    pub total_destroyed: AtomicUsize,
    pub total_retrieved: AtomicUsize,
    pub total_returned: AtomicUsize,
    pub acquire_timeouts: AtomicUsize,
    pub creation_failures: AtomicUsize,
    pub destruction_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, outstanding: usize, idle: usize, capacity: usize) -> PoolMetrics {
        let utilization = if capacity > 0 {
            outstanding as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_destroyed: self.total_destroyed.load(Ordering::Relaxed),
            total_retrieved: self.total_retrieved.load(Ordering::Relaxed),
            total_returned: self.total_returned.load(Ordering::Relaxed),
            acquire_timeouts: self.acquire_timeouts.load(Ordering::Relaxed),
            creation_failures: self.creation_failures.load(Ordering::Relaxed),
            destruction_failures: self.destruction_failures.load(Ordering::Relaxed),
            outstanding_resources: outstanding,
            idle_resources: idle,
            utilization,
            max_capacity: capacity,
        }
    }
}
