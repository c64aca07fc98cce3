use anyhow::{Result, anyhow};
use async_trait::async_trait;
use metricmon::datamodel::{Metric, MetricDataPoint, MetricStatus, NewMetric};
use metricmon::storage::{
    DataStatistics, InsertMetricOutcome, MetricTransition, StorageInstance,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Registry wrapper that injects failures and stale reads into a real backend.
#[derive(Debug)]
pub struct ScriptedStorage {
    inner: Arc<dyn StorageInstance>,
    fail_ingest: bool,
    stale_statistics: AtomicBool,
}

impl ScriptedStorage {
    pub fn new(inner: Arc<dyn StorageInstance>) -> Self {
        Self {
            inner,
            fail_ingest: false,
            stale_statistics: AtomicBool::new(false),
        }
    }

    /// Bulk appends always fail.
    pub fn failing_ingest(mut self) -> Self {
        self.fail_ingest = true;
        self
    }

    /// The next statistics query reports no data, as if rows committed
    /// concurrently were not visible yet.
    pub fn stale_statistics_once(self) -> Self {
        self.stale_statistics.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl StorageInstance for ScriptedStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        self.inner.create_or_migrate().await
    }
    async fn insert_metric(&self, metric: &NewMetric) -> Result<InsertMetricOutcome> {
        self.inner.insert_metric(metric).await
    }
    async fn get_metric(&self, uid: &Uuid) -> Result<Option<Metric>> {
        self.inner.get_metric(uid).await
    }
    async fn get_metric_by_name(&self, datasource: &str, name: &str) -> Result<Option<Metric>> {
        self.inner.get_metric_by_name(datasource, name).await
    }
    async fn list_metrics(
        &self,
        datasource: &str,
        status: Option<MetricStatus>,
    ) -> Result<Vec<Metric>> {
        self.inner.list_metrics(datasource, status).await
    }
    async fn transition_metric(&self, uid: &Uuid, transition: &MetricTransition) -> Result<bool> {
        self.inner.transition_metric(uid, transition).await
    }
    async fn delete_metric(&self, uid: &Uuid) -> Result<bool> {
        self.inner.delete_metric(uid).await
    }
    async fn add_data_points(&self, uid: &Uuid, points: &[MetricDataPoint]) -> Result<()> {
        if self.fail_ingest {
            return Err(anyhow!("disk full"));
        }
        self.inner.add_data_points(uid, points).await
    }
    async fn query_data_point_count(&self, uid: &Uuid) -> Result<u64> {
        self.inner.query_data_point_count(uid).await
    }
    async fn query_data_points(&self, uid: &Uuid) -> Result<Vec<MetricDataPoint>> {
        self.inner.query_data_points(uid).await
    }
    async fn query_data_statistics(&self, uid: &Uuid) -> Result<Option<DataStatistics>> {
        if self.stale_statistics.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.query_data_statistics(uid).await
    }
    async fn cleanup_test_data(&self) -> Result<()> {
        self.inner.cleanup_test_data().await
    }
}
