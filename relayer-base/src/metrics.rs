use std::time::UNIX_EPOCH;

use prometheus::{
    opts, register_int_counter_vec_with_registry, register_int_gauge_with_registry, Encoder,
    IntCounterVec, IntGauge, Registry,
};

const METRICS_NAMESPACE: &str = "relayer";

/// Prefix a metric name with the namespace.
fn namespaced(name: &str) -> String {
    format!("{}_{}", METRICS_NAMESPACE, name)
}

/// Metrics of a relayer process
#[derive(Clone)]
pub struct RelayerMetrics {
    /// Metrics registry for adding new metrics and gathering reports
    registry: Registry,
    /// Items waiting in the execution queue
    pub queue_length: IntGauge,
    /// Valid signatures collected, by network
    pub signatures_collected: IntCounterVec,
    /// Finished executions, by network, item type and outcome
    pub executions: IntCounterVec,
    /// Last time the worker loop ran, as seconds since the epoch
    pub worker_liveness: IntGauge,
}

impl std::fmt::Debug for RelayerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerMetrics")
            .field("queue_length", &self.queue_length.get())
            .finish_non_exhaustive()
    }
}

impl RelayerMetrics {
    pub fn new(registry: Registry) -> eyre::Result<Self> {
        let queue_length = register_int_gauge_with_registry!(
            opts!(
                namespaced("queue_length"),
                "The number of items in the execution queue",
            ),
            registry.clone()
        )?;
        let signatures_collected = register_int_counter_vec_with_registry!(
            opts!(
                namespaced("signatures_collected_total"),
                "The number of valid signatures collected for pending messages",
            ),
            &["network"],
            registry.clone()
        )?;
        let executions = register_int_counter_vec_with_registry!(
            opts!(
                namespaced("executions_total"),
                "The number of queue items executed, by outcome",
            ),
            &["network", "item_type", "outcome"],
            registry.clone()
        )?;
        let worker_liveness = register_int_gauge_with_registry!(
            opts!(
                namespaced("worker_liveness_timestamp"),
                "The liveness of the execution worker, expressed as a timestamp since the epoch",
            ),
            registry.clone()
        )?;
        Ok(Self {
            registry,
            queue_length,
            signatures_collected,
            executions,
            worker_liveness,
        })
    }

    pub fn update_liveness_metric(&self) {
        self.worker_liveness.set(
            UNIX_EPOCH
                .elapsed()
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
        );
    }

    pub fn record_execution(&self, network: &str, item_type: &str, outcome: &str) {
        self.executions
            .with_label_values(&[network, item_type, outcome])
            .inc();
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format)
    /// report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn dummy_instance() -> Self {
        let registry = Registry::new();
        let instance = Self::new(registry);
        instance.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_labelled_executions() {
        let metrics = RelayerMetrics::dummy_instance();
        metrics.record_execution("ganache", "Message", "success");
        metrics.queue_length.set(2);

        let report = String::from_utf8(metrics.gather().unwrap()).unwrap();
        assert!(report.contains(
            r#"relayer_executions_total{item_type="Message",network="ganache",outcome="success"} 1"#
        ));
        assert!(report.contains("relayer_queue_length 2"));
    }
}
