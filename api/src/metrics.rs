use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Default, Serialize)]
pub struct Metrics {
    pub total_requests: u64,
    pub errors: u64,
    pub average_response_time_ms: u64,
    pub operations: HashMap<String, u64>,
}

pub struct MetricsCollector {
    metrics: Arc<RwLock<Metrics>>,
    response_times: Arc<RwLock<Vec<Duration>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(Metrics::default())),
            response_times: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn record_request(&self, operation: &str) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;
        *metrics
            .operations
            .entry(operation.to_string())
            .or_insert(0) += 1;
    }

    pub async fn record_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.errors += 1;
    }

    pub async fn record_response_time(&self, duration: Duration) {
        let mut times = self.response_times.write().await;
        times.push(duration);

        // keep only the last 1000 samples
        if times.len() > 1000 {
            let excess = times.len() - 1000;
            times.drain(0..excess);
        }

        if !times.is_empty() {
            let avg_ms =
                times.iter().map(|d| d.as_millis() as u64).sum::<u64>() / times.len() as u64;
            let mut metrics = self.metrics.write().await;
            metrics.average_response_time_ms = avg_ms;
        }
    }

    pub async fn get_metrics(&self) -> Metrics {
        self.metrics.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_per_operation_counters() {
        let collector = MetricsCollector::new();
        collector.record_request("explain").await;
        collector.record_request("explain").await;
        collector.record_request("chat").await;
        collector.record_error().await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.operations.get("explain"), Some(&2));
        assert_eq!(metrics.operations.get("chat"), Some(&1));
    }
}
