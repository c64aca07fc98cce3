use crate::datamodel::{Metric, MetricDataPoint, MetricStatus, NewMetric};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt::Debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum InsertMetricOutcome {
    Inserted(Metric),
    /// The `(datasource, name)` pair is already used by another metric.
    NameTaken { existing_uid: Uuid },
}

/// What a conditional metric update does with one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Assign<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Assign<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Assign::Keep)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Assign::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// A status change applied atomically, only if the current status is one of
/// `allowed_from`. An empty `allowed_from` accepts any current status.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTransition {
    pub allowed_from: Vec<MetricStatus>,
    pub to: MetricStatus,
    pub parameters: Assign<JsonValue>,
    pub model_params: Assign<JsonValue>,
    pub server: Assign<String>,
    pub message: Assign<String>,
}

impl MetricTransition {
    pub fn new(allowed_from: &[MetricStatus], to: MetricStatus) -> Self {
        Self {
            allowed_from: allowed_from.to_vec(),
            to,
            parameters: Assign::Keep,
            model_params: Assign::Keep,
            server: Assign::Keep,
            message: Assign::Keep,
        }
    }

    pub fn parameters(mut self, parameters: Assign<JsonValue>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn model_params(mut self, model_params: Assign<JsonValue>) -> Self {
        self.model_params = model_params;
        self
    }

    pub fn server(mut self, server: Assign<String>) -> Self {
        self.server = server;
        self
    }

    pub fn message(mut self, message: Assign<String>) -> Self {
        self.message = message;
        self
    }
}

/// Count and value range of a metric's stored rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataStatistics {
    pub count: u64,
    pub min: f64,
    pub max: f64,
}

/// The durable registry of metrics and their data points.
///
/// Implementations must make `insert_metric` and `transition_metric` atomic:
/// concurrent callers rely on them instead of any in-process lock.
#[async_trait]
pub trait StorageInstance: Send + Sync + Debug {
    async fn create_or_migrate(&self) -> Result<()>;

    async fn insert_metric(&self, metric: &NewMetric) -> Result<InsertMetricOutcome>;
    async fn get_metric(&self, uid: &Uuid) -> Result<Option<Metric>>;
    async fn get_metric_by_name(&self, datasource: &str, name: &str) -> Result<Option<Metric>>;
    async fn list_metrics(
        &self,
        datasource: &str,
        status: Option<MetricStatus>,
    ) -> Result<Vec<Metric>>;

    /// Returns whether the guarded update matched a row.
    async fn transition_metric(&self, uid: &Uuid, transition: &MetricTransition) -> Result<bool>;

    /// Removes the metric and all of its data points. Returns whether it existed.
    async fn delete_metric(&self, uid: &Uuid) -> Result<bool>;

    async fn add_data_points(&self, uid: &Uuid, points: &[MetricDataPoint]) -> Result<()>;
    async fn query_data_point_count(&self, uid: &Uuid) -> Result<u64>;
    /// All rows of the metric, ordered by timestamp then insertion order.
    async fn query_data_points(&self, uid: &Uuid) -> Result<Vec<MetricDataPoint>>;
    /// `None` when the metric has no rows.
    async fn query_data_statistics(&self, uid: &Uuid) -> Result<Option<DataStatistics>>;

    #[cfg(any(test, feature = "test-utils"))]
    async fn cleanup_test_data(&self) -> Result<()>;
}
