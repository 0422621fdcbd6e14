use crate::classifier::StatusClass;
use crate::key_generator::BucketKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMetrics {
    pub attempts: u64,
    pub successes: u64,
    pub fatal_errors: u64,
    pub retries: u64,
    pub exhausted: u64,
}

/// Per-bucket counters of dispatch activity, keyed by the bucket's display form.
///
/// One entry is kept per bucket ever dispatched to. Long-running callers
/// touching many guilds or channels should export and [`DispatchMetrics::drain`]
/// periodically.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetrics {
    buckets: Arc<RwLock<HashMap<String, BucketMetrics>>>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the classification of one network attempt
    pub async fn record_attempt(&self, bucket: &BucketKey, class: StatusClass) {
        let mut metrics = self.buckets.write().await;
        let entry = metrics.entry(bucket.to_string()).or_default();

        entry.attempts += 1;
        match class {
            StatusClass::Success => entry.successes += 1,
            StatusClass::FatalClientError => entry.fatal_errors += 1,
            StatusClass::Transient => {}
        }
    }

    pub async fn record_retry(&self, bucket: &BucketKey) {
        let mut metrics = self.buckets.write().await;
        metrics.entry(bucket.to_string()).or_default().retries += 1;
    }

    pub async fn record_exhausted(&self, bucket: &BucketKey) {
        let mut metrics = self.buckets.write().await;
        metrics.entry(bucket.to_string()).or_default().exhausted += 1;
    }

    pub async fn bucket_metrics(&self, bucket: &BucketKey) -> Option<BucketMetrics> {
        let metrics = self.buckets.read().await;
        metrics.get(&bucket.to_string()).cloned()
    }

    pub async fn all_metrics(&self) -> HashMap<String, BucketMetrics> {
        let metrics = self.buckets.read().await;
        metrics.clone()
    }

    pub async fn reset_bucket_metrics(&self, bucket: &BucketKey) {
        let mut metrics = self.buckets.write().await;
        if let Some(entry) = metrics.get_mut(&bucket.to_string()) {
            *entry = BucketMetrics::default();
        }
    }

    pub async fn remove_bucket_metrics(&self, bucket: &BucketKey) -> Option<BucketMetrics> {
        let mut metrics = self.buckets.write().await;
        metrics.remove(&bucket.to_string())
    }

    /// Take every counter collected so far, leaving the collector empty
    pub async fn drain(&self) -> HashMap<String, BucketMetrics> {
        let mut metrics = self.buckets.write().await;
        std::mem::take(&mut *metrics)
    }

    pub async fn global_metrics(&self) -> BucketMetrics {
        let metrics = self.buckets.read().await;
        let mut global = BucketMetrics::default();

        for entry in metrics.values() {
            global.attempts += entry.attempts;
            global.successes += entry.successes;
            global.fatal_errors += entry.fatal_errors;
            global.retries += entry.retries;
            global.exhausted += entry.exhausted;
        }

        global
    }
}
