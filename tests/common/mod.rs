#![allow(dead_code)]

use anyhow::{Result, anyhow};
use metricmon::datamodel::{Metric, MetricStatus};
use metricmon::lifecycle::MetricLifecycleController;
use uuid::Uuid;

mod scripted_storage;

pub use metricmon::test_utils::fixtures;
pub use scripted_storage::ScriptedStorage;
pub use metricmon::test_utils::{TEST_RECORD_THRESHOLD, TestDb};

/// Helper trait for easier testing
pub trait TestHelpers {
    fn expect_status(
        &self,
        uid: &Uuid,
        expected: MetricStatus,
    ) -> impl std::future::Future<Output = Result<Metric>> + Send;

    fn expect_unmonitored(
        &self,
        uid: &Uuid,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl TestHelpers for MetricLifecycleController {
    async fn expect_status(&self, uid: &Uuid, expected: MetricStatus) -> Result<Metric> {
        let metric = self.get_metric(uid).await?;
        if metric.status != expected {
            return Err(anyhow!(
                "Expected metric {} to be {}, found {}",
                uid,
                expected,
                metric.status
            ));
        }
        Ok(metric)
    }

    async fn expect_unmonitored(&self, uid: &Uuid) -> Result<()> {
        let metric = self.expect_status(uid, MetricStatus::Unmonitored).await?;
        if metric.parameters.is_some() || metric.model_params.is_some() {
            return Err(anyhow!("Unmonitored metric {} still has a model spec", uid));
        }
        Ok(())
    }
}
